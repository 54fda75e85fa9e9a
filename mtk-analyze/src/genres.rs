//! Genre frequency table

use crate::sanitize::ScoredRecord;
use mtk_common::{stats, TagMatch};
use serde::Serialize;
use std::collections::BTreeMap;

/// Labels listed in the frequency table
pub const DEFAULT_TOP_GENRES: usize = 15;

/// Occurrence count and mean score of one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreFrequency {
    pub genre: String,
    /// Records carrying the label exactly
    pub count: usize,
    /// Mean score of records whose tag string contains the label
    pub avg_score: Option<f64>,
}

/// Exact label counts across all records, most frequent first, ties by name
pub fn label_counts(records: &[ScoredRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        for label in record.record.tags.labels() {
            *counts.entry(label).or_default() += 1;
        }
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Top `n` labels by frequency
pub fn frequency(records: &[ScoredRecord], n: usize) -> Vec<GenreFrequency> {
    label_counts(records)
        .into_iter()
        .take(n)
        .map(|(genre, count)| {
            let scores: Vec<f64> = records
                .iter()
                .filter(|r| r.record.tags.matches(&genre, TagMatch::SubstringCaseSensitive))
                .map(|r| r.score)
                .collect();
            GenreFrequency {
                avg_score: stats::mean(&scores),
                genre,
                count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtk_common::{Record, Tags};

    fn scored(id: i64, score: f64, tags: &str) -> ScoredRecord {
        ScoredRecord {
            record: Record {
                id,
                title: format!("Title {}", id),
                score: Some(score),
                members: Some(100),
                demographic: None,
                tags: Tags::from_raw(tags),
            },
            score,
            members: 100,
        }
    }

    #[test]
    fn test_counts_sorted_with_name_ties() {
        let records = vec![
            scored(1, 8.0, "Drama, Comedy"),
            scored(2, 6.0, "Comedy"),
            scored(3, 7.0, "Action, Drama"),
            scored(4, 9.0, "Romance"),
        ];
        let counts = label_counts(&records);
        assert_eq!(
            counts,
            vec![
                ("Comedy".to_string(), 2),
                ("Drama".to_string(), 2),
                ("Action".to_string(), 1),
                ("Romance".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_mean_score_uses_case_sensitive_containment() {
        let records = vec![
            scored(1, 8.0, "Love Polygon"),
            scored(2, 6.0, "Boys Love"),
            scored(3, 4.0, "love"),
        ];
        let table = frequency(&records, 2);
        assert_eq!(table.len(), 2);
        let boys = table.iter().find(|g| g.genre == "Boys Love").unwrap();
        assert_eq!(boys.count, 1);
        assert_eq!(boys.avg_score, Some(6.0));

        let table = frequency(
            &[scored(1, 8.0, "Love Polygon"), scored(2, 6.0, "Love")],
            DEFAULT_TOP_GENRES,
        );
        let love = table.iter().find(|g| g.genre == "Love").unwrap();
        assert_eq!(love.count, 1);
        assert_eq!(love.avg_score, Some(7.0));
    }
}
