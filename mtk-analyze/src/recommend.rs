//! Creator recommendations derived from the trend ranking
//!
//! Every list keeps the ranking order (strongest trend first) and is capped
//! at [`LIST_LIMIT`] entries.

use crate::sanitize::ScoredRecord;
use crate::trend::{TrendEntry, TrendRanking};
use serde::Serialize;
use std::collections::BTreeMap;

/// Entries per recommendation list
pub const LIST_LIMIT: usize = 5;

/// Tag count range of a niche, inclusive
pub const NICHE_COUNT: (usize, usize) = (3, 20);
/// Minimum average score of a niche
pub const NICHE_MIN_SCORE: f64 = 7.5;
/// Tags matching more records than this are saturated
pub const SATURATED_COUNT: usize = 50;

/// Two labels carried by the same record, in name order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenrePair {
    pub first: String,
    pub second: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    /// Strongest trends; their averages are the target score and expected reach
    pub high_priority: Vec<TrendEntry>,
    /// High quality tags with few titles
    pub niche: Vec<TrendEntry>,
    /// Tags with many competing titles
    pub saturated: Vec<TrendEntry>,
    /// Most frequent label pairs
    pub combinations: Vec<GenrePair>,
}

fn is_niche(entry: &TrendEntry) -> bool {
    let agg = &entry.aggregate;
    (NICHE_COUNT.0..=NICHE_COUNT.1).contains(&agg.count) && agg.avg_score >= NICHE_MIN_SCORE
}

fn is_saturated(entry: &TrendEntry) -> bool {
    entry.aggregate.count > SATURATED_COUNT
}

/// Count every unordered label pair per record; most frequent first, ties by pair
pub fn pair_counts(records: &[ScoredRecord]) -> Vec<GenrePair> {
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for record in records {
        let labels: Vec<&str> = record.record.tags.labels().collect();
        if labels.len() < 2 {
            continue;
        }
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                let key = if a <= b {
                    (a.to_string(), b.to_string())
                } else {
                    (b.to_string(), a.to_string())
                };
                *counts.entry(key).or_default() += 1;
            }
        }
    }

    let mut pairs: Vec<GenrePair> = counts
        .into_iter()
        .map(|((first, second), count)| GenrePair {
            first,
            second,
            count,
        })
        .collect();
    pairs.sort_by(|a, b| b.count.cmp(&a.count));
    pairs
}

pub fn recommend(ranking: &TrendRanking, records: &[ScoredRecord]) -> Recommendations {
    let pick = |filter: fn(&TrendEntry) -> bool| -> Vec<TrendEntry> {
        ranking
            .entries
            .iter()
            .filter(|e| filter(*e))
            .take(LIST_LIMIT)
            .cloned()
            .collect()
    };

    let mut combinations = pair_counts(records);
    combinations.truncate(LIST_LIMIT);

    Recommendations {
        high_priority: ranking.top(LIST_LIMIT).to_vec(),
        niche: pick(is_niche),
        saturated: pick(is_saturated),
        combinations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::TrendAggregate;
    use mtk_common::{Record, Tags};

    fn entry(tag: &str, count: usize, avg_score: f64, strength: f64) -> TrendEntry {
        TrendEntry {
            tag: tag.to_string(),
            aggregate: TrendAggregate {
                count,
                avg_score,
                avg_members: 1000.0,
                volatility: 0.5,
                trend_strength: strength,
            },
        }
    }

    fn scored(id: i64, tags: &str) -> ScoredRecord {
        ScoredRecord {
            record: Record {
                id,
                title: format!("Title {}", id),
                score: Some(7.0),
                members: Some(100),
                demographic: None,
                tags: Tags::from_raw(tags),
            },
            score: 7.0,
            members: 100,
        }
    }

    fn ranking() -> TrendRanking {
        TrendRanking {
            entries: vec![
                entry("Action", 120, 7.1, 0.90),
                entry("Award Winning", 12, 8.3, 0.85),
                entry("Drama", 60, 7.6, 0.80),
                entry("Gore", 20, 7.5, 0.70),
                entry("Iyashikei", 21, 7.9, 0.65),
                entry("Harem", 8, 6.2, 0.60),
                entry("Comedy", 51, 7.0, 0.55),
            ],
            undefined: Vec::new(),
            below_support: 0,
        }
    }

    #[test]
    fn test_lists_keep_rank_order_and_thresholds() {
        let recs = recommend(&ranking(), &[]);

        let tags = |list: &[TrendEntry]| list.iter().map(|e| e.tag.clone()).collect::<Vec<_>>();
        assert_eq!(
            tags(&recs.high_priority),
            vec!["Action", "Award Winning", "Drama", "Gore", "Iyashikei"]
        );
        // 21 titles is past the niche band, 6.2 is below the score floor
        assert_eq!(tags(&recs.niche), vec!["Award Winning", "Gore"]);
        // exactly 50 would not count; 51 does
        assert_eq!(tags(&recs.saturated), vec!["Action", "Drama", "Comedy"]);
        assert!(recs.combinations.is_empty());
    }

    #[test]
    fn test_pairs_are_unordered_and_ranked() {
        let records = vec![
            scored(1, "Romance, Comedy"),
            scored(2, "Comedy, Romance, School"),
            scored(3, "School, Comedy"),
            scored(4, "Drama"),
        ];
        let pairs = pair_counts(&records);

        assert_eq!(pairs[0].first, "Comedy");
        assert_eq!(pairs[0].second, "Romance");
        assert_eq!(pairs[0].count, 2);
        assert_eq!((pairs[1].first.as_str(), pairs[1].second.as_str()), ("Comedy", "School"));
        assert_eq!(pairs[1].count, 2);
        assert_eq!((pairs[2].first.as_str(), pairs[2].second.as_str()), ("Romance", "School"));
        assert_eq!(pairs.len(), 3);
    }
}
