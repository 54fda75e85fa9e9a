//! Genre trend scoring
//!
//! For every distinct tag label the matching records are aggregated and the
//! tag gets a heuristic `trend_strength`:
//!
//! ```text
//! trend_strength = 0.4 * (avg_score / 10)
//!                + 0.4 * (log10(avg_members) / 6)
//!                + 0.1 * volatility
//! volatility     = std(members) / (avg_members + 1)
//! ```
//!
//! The volatility coefficient is the net of an outer 0.2 weight and an inner
//! 0.5 factor; it must stay 0.1 for rankings to be reproducible.
//!
//! Tags with fewer than `min_support` matches are left out. Tags whose
//! average members is zero have no defined log term and are reported
//! separately instead of being ranked. Ranking is by `trend_strength`
//! descending, then tag name ascending.

use crate::sanitize::ScoredRecord;
use mtk_common::{stats, TagMatch};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Minimum matching records for a tag to be ranked
pub const DEFAULT_MIN_SUPPORT: usize = 3;

const SCORE_WEIGHT: f64 = 0.4;
const MEMBERS_WEIGHT: f64 = 0.4;
const VOLATILITY_WEIGHT: f64 = 0.2 * 0.5;
const SCORE_SCALE: f64 = 10.0;
/// log10 of one million members maps to 1.0
const LOG_MEMBERS_SCALE: f64 = 6.0;

/// Blend of normalized score, log-scaled popularity and volatility
///
/// `None` when `avg_members` is not positive (log10 undefined).
pub fn trend_strength(avg_score: f64, avg_members: f64, volatility: f64) -> Option<f64> {
    if avg_members.is_nan() || avg_members <= 0.0 {
        return None;
    }
    Some(
        SCORE_WEIGHT * (avg_score / SCORE_SCALE)
            + MEMBERS_WEIGHT * (avg_members.log10() / LOG_MEMBERS_SCALE)
            + VOLATILITY_WEIGHT * volatility,
    )
}

/// Aggregated statistics of the records matching one tag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAggregate {
    pub count: usize,
    pub avg_score: f64,
    pub avg_members: f64,
    pub volatility: f64,
    pub trend_strength: f64,
}

/// Raw aggregates of one tag before scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagStats {
    pub count: usize,
    pub avg_score: f64,
    pub avg_members: f64,
    pub volatility: f64,
}

/// One ranked tag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendEntry {
    pub tag: String,
    #[serde(flatten)]
    pub aggregate: TrendAggregate,
}

/// Ranked tags, strongest first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendRanking {
    pub entries: Vec<TrendEntry>,
    /// Tags with enough support but zero average members
    pub undefined: Vec<String>,
    /// Number of tags left out for insufficient support
    pub below_support: usize,
}

impl TrendRanking {
    pub fn get(&self, tag: &str) -> Option<&TrendAggregate> {
        self.entries
            .iter()
            .find(|e| e.tag == tag)
            .map(|e| &e.aggregate)
    }

    pub fn top(&self, n: usize) -> &[TrendEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

/// Distinct tag labels across the records, sorted
pub fn distinct_tags(records: &[ScoredRecord]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(|r| r.record.tags.labels())
        .map(str::to_string)
        .collect()
}

/// Trend scorer configuration
#[derive(Debug, Clone, Copy)]
pub struct TrendScorer {
    min_support: usize,
    policy: TagMatch,
}

impl Default for TrendScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SUPPORT, TagMatch::default())
    }
}

impl TrendScorer {
    pub fn new(min_support: usize, policy: TagMatch) -> Self {
        Self {
            min_support,
            policy,
        }
    }

    /// Aggregate one tag; `None` below minimum support
    pub fn aggregate(&self, tag: &str, records: &[ScoredRecord]) -> Option<TagStats> {
        let matches: Vec<&ScoredRecord> = records
            .iter()
            .filter(|r| r.record.tags.matches(tag, self.policy))
            .collect();
        if matches.is_empty() || matches.len() < self.min_support {
            return None;
        }

        let scores: Vec<f64> = matches.iter().map(|r| r.score).collect();
        let members: Vec<f64> = matches.iter().map(|r| r.members_f64()).collect();
        let avg_score = stats::mean(&scores)?;
        let avg_members = stats::mean(&members)?;
        // A single matching record has no spread
        let volatility = stats::sample_std(&members).unwrap_or(0.0) / (avg_members + 1.0);

        Some(TagStats {
            count: matches.len(),
            avg_score,
            avg_members,
            volatility,
        })
    }

    /// Score and rank every distinct tag, recomputed from scratch
    pub fn rank(&self, records: &[ScoredRecord]) -> TrendRanking {
        let tags = distinct_tags(records);
        let mut ranking = TrendRanking::default();

        for tag in tags {
            let Some(tag_stats) = self.aggregate(&tag, records) else {
                ranking.below_support += 1;
                continue;
            };

            match trend_strength(
                tag_stats.avg_score,
                tag_stats.avg_members,
                tag_stats.volatility,
            ) {
                Some(strength) => ranking.entries.push(TrendEntry {
                    tag,
                    aggregate: TrendAggregate {
                        count: tag_stats.count,
                        avg_score: tag_stats.avg_score,
                        avg_members: tag_stats.avg_members,
                        volatility: tag_stats.volatility,
                        trend_strength: strength,
                    },
                }),
                None => {
                    debug!(tag = %tag, "Zero average members, trend strength undefined");
                    ranking.undefined.push(tag);
                }
            }
        }

        ranking.entries.sort_by(|a, b| {
            b.aggregate
                .trend_strength
                .total_cmp(&a.aggregate.trend_strength)
                .then_with(|| a.tag.cmp(&b.tag))
        });

        debug!(
            ranked = ranking.entries.len(),
            below_support = ranking.below_support,
            undefined = ranking.undefined.len(),
            policy = %self.policy,
            "Trend ranking complete"
        );
        ranking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtk_common::{Record, Tags};

    fn scored(id: i64, score: f64, members: u64, tags: &str) -> ScoredRecord {
        ScoredRecord {
            record: Record {
                id,
                title: format!("Title {}", id),
                score: Some(score),
                members: Some(members),
                demographic: None,
                tags: Tags::from_raw(tags),
            },
            score,
            members,
        }
    }

    #[test]
    fn test_trend_strength_formula() {
        // 0.4 * 0.8 + 0.4 * (4 / 6) + 0.1 * 0.5
        let s = trend_strength(8.0, 10_000.0, 0.5).unwrap();
        assert!((s - (0.32 + 0.4 * 4.0 / 6.0 + 0.05)).abs() < 1e-12);
    }

    #[test]
    fn test_trend_strength_undefined_for_zero_members() {
        assert_eq!(trend_strength(8.0, 0.0, 0.0), None);
    }

    #[test]
    fn test_monotonic_in_score_and_members() {
        let mut prev = f64::NEG_INFINITY;
        for score in [0.0, 2.5, 5.0, 7.5, 10.0] {
            let s = trend_strength(score, 1000.0, 0.3).unwrap();
            assert!(s >= prev);
            prev = s;
        }
        let mut prev = f64::NEG_INFINITY;
        for members in [1.0, 10.0, 500.0, 80_000.0, 2_000_000.0] {
            let s = trend_strength(7.0, members, 0.3).unwrap();
            assert!(s >= prev);
            prev = s;
        }
    }

    #[test]
    fn test_tag_with_two_matches_is_excluded() {
        let records = vec![
            scored(1, 8.0, 1000, "Action, Drama"),
            scored(2, 7.0, 2000, "Action, Drama"),
            scored(3, 6.0, 3000, "Action"),
        ];
        let ranking = TrendScorer::default().rank(&records);
        assert!(ranking.get("Action").is_some());
        assert!(ranking.get("Drama").is_none());
        assert_eq!(ranking.below_support, 1);
    }

    #[test]
    fn test_aggregate_values() {
        let records = vec![
            scored(1, 8.0, 1000, "Action"),
            scored(2, 7.0, 2000, "Action"),
            scored(3, 6.0, 3000, "Action"),
        ];
        let ranking = TrendScorer::default().rank(&records);
        let agg = ranking.get("Action").unwrap();
        assert_eq!(agg.count, 3);
        assert!((agg.avg_score - 7.0).abs() < 1e-12);
        assert!((agg.avg_members - 2000.0).abs() < 1e-12);
        // sample std of 1000,2000,3000 is 1000
        assert!((agg.volatility - 1000.0 / 2001.0).abs() < 1e-12);
    }

    #[test]
    fn test_substring_policy_counts_containing_tags() {
        let records = vec![
            scored(1, 8.0, 1000, "Love Polygon"),
            scored(2, 7.0, 2000, "Boys Love"),
            scored(3, 6.0, 3000, "Girls Love"),
        ];
        let substring = TrendScorer::new(3, TagMatch::Substring).rank(&records);
        assert_eq!(substring.get("Boys Love"), None);
        let exact = TrendScorer::new(1, TagMatch::Exact).rank(&records);
        assert_eq!(exact.get("Boys Love").unwrap().count, 1);

        let records = vec![
            scored(1, 8.0, 1000, "Romance"),
            scored(2, 7.0, 2000, "Romantic Subtext"),
            scored(3, 6.0, 3000, "romance"),
        ];
        let substring = TrendScorer::new(2, TagMatch::Substring).rank(&records);
        assert_eq!(substring.get("Romance").unwrap().count, 2);
        assert_eq!(substring.get("romance").unwrap().count, 2);
        let roman = TrendScorer::new(2, TagMatch::Substring).aggregate("Roman", &records);
        assert_eq!(roman.unwrap().count, 3);
    }

    #[test]
    fn test_zero_member_tag_is_reported_not_ranked() {
        let records = vec![
            scored(1, 8.0, 0, "Doujinshi"),
            scored(2, 7.0, 0, "Doujinshi"),
            scored(3, 6.0, 0, "Doujinshi"),
        ];
        let ranking = TrendScorer::default().rank(&records);
        assert!(ranking.entries.is_empty());
        assert_eq!(ranking.undefined, vec!["Doujinshi".to_string()]);
    }

    #[test]
    fn test_ties_break_by_tag_name() {
        let records = vec![
            scored(1, 8.0, 1000, "Zombies, Aliens"),
            scored(2, 8.0, 1000, "Zombies, Aliens"),
            scored(3, 8.0, 1000, "Zombies, Aliens"),
        ];
        let ranking = TrendScorer::default().rank(&records);
        let tags: Vec<_> = ranking.entries.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["Aliens", "Zombies"]);
    }

    #[test]
    fn test_rerun_is_identical() {
        let records: Vec<_> = (0..30)
            .map(|i| {
                let tags = ["Action, Comedy", "Drama", "Comedy, Romance", "Action"][i % 4];
                scored(i as i64, 5.0 + (i % 5) as f64, 100 * (i as u64 + 1), tags)
            })
            .collect();
        let scorer = TrendScorer::default();
        assert_eq!(scorer.rank(&records), scorer.rank(&records));
    }
}
