//! End-to-end analysis pipeline
//!
//! load CSV -> sanitize -> quartiles -> classify -> trends -> correlation
//! -> summaries -> report. Every stage works on the full in-memory dataset
//! and nothing is written until the report is complete.

use crate::classifier::{classify_all, Quartiles};
use crate::correlation;
use crate::demographics;
use crate::error::{AnalyzeError, Result};
use crate::genres::{self, DEFAULT_TOP_GENRES};
use crate::insights;
use crate::recommend;
use crate::report::{AnalysisReport, DatasetOverview, SessionInfo};
use crate::sanitize::sanitize;
use crate::trend::TrendScorer;
use mtk_common::config::AnalysisConfig;
use mtk_common::{dataset, Record};
use std::time::Instant;
use tracing::{info, warn};

/// Load the configured dataset and analyze it
pub fn run(config: &AnalysisConfig) -> Result<AnalysisReport> {
    info!(input = %config.input.display(), "Loading dataset");
    let read = dataset::read_csv_lenient(&config.input)?;
    if read.skipped > 0 {
        warn!(skipped = read.skipped, "Skipped malformed dataset rows");
    }
    analyze(read.records, config)
}

/// Analyze an already loaded record set
pub fn analyze(records: Vec<Record>, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let start = Instant::now();
    let loaded = records.len();

    let sanitized = sanitize(records)?;
    let quartiles = Quartiles::from_population(&sanitized.records).ok_or(
        AnalyzeError::EmptyDataset {
            dropped: sanitized.dropped,
        },
    )?;

    let classification = classify_all(&sanitized.records, quartiles);
    let trends = TrendScorer::new(config.min_support, config.tag_match).rank(&sanitized.records);
    info!(
        ranked = trends.entries.len(),
        undefined = trends.undefined.len(),
        "Scored genre trends"
    );

    let features = correlation::encode_features(&sanitized.records);
    let correlation = correlation::analyze(&features);
    let demographics = demographics::summarize(&sanitized.records);
    let genres = genres::frequency(&sanitized.records, DEFAULT_TOP_GENRES);
    let recommendations = recommend::recommend(&trends, &sanitized.records);
    let insights = insights::statistical_insights(&sanitized);
    let summary = insights::executive_summary(&sanitized, &demographics);

    let report = AnalysisReport {
        session: SessionInfo::new(
            config.input.clone(),
            config.top_n,
            config.min_support,
            config.tag_match.to_string(),
        ),
        dataset: DatasetOverview {
            loaded,
            kept: sanitized.records.len(),
            dropped: sanitized.dropped,
            score: sanitized.score.clone(),
            members: sanitized.members.clone(),
            genre_features: features.genre_features,
            demographic_features: features.demographic_features,
        },
        classification,
        trends,
        correlation,
        demographics,
        genres,
        recommendations,
        insights,
        summary,
    };

    info!(
        records = report.dataset.kept,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Analysis complete"
    );
    Ok(report)
}
