//! Per-demographic summary table

use crate::sanitize::ScoredRecord;
use mtk_common::stats;
use serde::Serialize;
use std::collections::BTreeMap;

/// Score and popularity statistics of one demographic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicSummary {
    pub demographic: String,
    pub count: usize,
    pub mean_score: f64,
    pub median_score: f64,
    /// `None` for a single record
    pub std_score: Option<f64>,
    pub mean_members: f64,
    pub std_members: Option<f64>,
}

/// Summaries of every non-null demographic, highest mean score first
pub fn summarize(records: &[ScoredRecord]) -> Vec<DemographicSummary> {
    let mut groups: BTreeMap<&str, Vec<&ScoredRecord>> = BTreeMap::new();
    for record in records {
        if let Some(demographic) = record.record.demographic.as_deref() {
            groups.entry(demographic).or_default().push(record);
        }
    }

    let mut table: Vec<DemographicSummary> = groups
        .into_iter()
        .filter_map(|(demographic, group)| {
            let scores: Vec<f64> = group.iter().map(|r| r.score).collect();
            let members: Vec<f64> = group.iter().map(|r| r.members_f64()).collect();
            Some(DemographicSummary {
                demographic: demographic.to_string(),
                count: group.len(),
                mean_score: stats::mean(&scores)?,
                median_score: stats::median(&scores)?,
                std_score: stats::sample_std(&scores),
                mean_members: stats::mean(&members)?,
                std_members: stats::sample_std(&members),
            })
        })
        .collect();

    // BTreeMap order makes equal means fall back to name
    table.sort_by(|a, b| b.mean_score.total_cmp(&a.mean_score));
    table
}
