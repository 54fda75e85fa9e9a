//! Record sanitization
//!
//! Classification and trend scoring need both `score` and `members`; records
//! lacking either are dropped here, before any analysis sees them. Only the
//! dropped count is reported.

use crate::error::{AnalyzeError, Result};
use mtk_common::{stats, Record};
use serde::Serialize;
use tracing::info;

/// A record known to carry both metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: Record,
    pub score: f64,
    pub members: u64,
}

impl ScoredRecord {
    pub fn members_f64(&self) -> f64 {
        self.members as f64
    }
}

/// Location and range summary of one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    /// Summarize a non-empty sample
    pub fn of(values: &[f64]) -> Option<Self> {
        let (min, max) = stats::min_max(values)?;
        Some(Self {
            mean: stats::mean(values)?,
            median: stats::median(values)?,
            min,
            max,
        })
    }
}

/// Output of sanitization
#[derive(Debug, Clone)]
pub struct Sanitized {
    pub records: Vec<ScoredRecord>,
    pub dropped: usize,
    pub score: MetricSummary,
    pub members: MetricSummary,
}

impl Sanitized {
    pub fn scores(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.score).collect()
    }

    pub fn members(&self) -> Vec<f64> {
        self.records.iter().map(ScoredRecord::members_f64).collect()
    }
}

/// Drop records missing `score` or `members`
pub fn sanitize(records: Vec<Record>) -> Result<Sanitized> {
    let total = records.len();
    let kept: Vec<ScoredRecord> = records
        .into_iter()
        .filter_map(|record| {
            let (score, members) = record.metrics()?;
            Some(ScoredRecord {
                record,
                score,
                members,
            })
        })
        .collect();
    let dropped = total - kept.len();

    let scores: Vec<f64> = kept.iter().map(|r| r.score).collect();
    let members: Vec<f64> = kept.iter().map(ScoredRecord::members_f64).collect();
    let (score, members) = match (MetricSummary::of(&scores), MetricSummary::of(&members)) {
        (Some(s), Some(m)) => (s, m),
        _ => return Err(AnalyzeError::EmptyDataset { dropped }),
    };

    info!(kept = kept.len(), dropped, "Sanitized dataset");

    Ok(Sanitized {
        records: kept,
        dropped,
        score,
        members,
    })
}
