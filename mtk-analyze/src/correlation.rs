//! Feature encoding and correlation analysis
//!
//! Tags and demographics are expanded into 0/1 indicator columns (one per
//! genre label and one `Demo_<name>` per demographic) next to the `score` and
//! `members` columns. Every column is then correlated (Pearson) with `score`
//! and with `members` to list what drives quality and popularity.
//!
//! Columns with an undefined correlation (constant indicator) are omitted.

use crate::sanitize::ScoredRecord;
use mtk_common::stats;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Prefix of demographic indicator columns
pub const DEMOGRAPHIC_PREFIX: &str = "Demo_";

const SCORE_COLUMN: &str = "score";
const MEMBERS_COLUMN: &str = "members";

/// Top drivers listed per metric
const TOP_DRIVERS: usize = 10;
/// Bottom drivers listed per metric
const BOTTOM_DRIVERS: usize = 5;

/// Qualitative strength of a correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strength {
    #[serde(rename = "Very Strong")]
    VeryStrong,
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    pub fn of(r: f64) -> Self {
        let r = r.abs();
        if r > 0.5 {
            Strength::VeryStrong
        } else if r > 0.3 {
            Strength::Strong
        } else if r > 0.1 {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strength::VeryStrong => "Very Strong",
            Strength::Strong => "Strong",
            Strength::Moderate => "Moderate",
            Strength::Weak => "Weak",
        }
    }
}

/// Column-oriented numeric features, one row per record
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
    pub genre_features: usize,
    pub demographic_features: usize,
}

impl FeatureMatrix {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }
}

/// Expand records into score, members and indicator columns
pub fn encode_features(records: &[ScoredRecord]) -> FeatureMatrix {
    let genres: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.record.tags.labels())
        .collect();
    let demographics: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.record.demographic.as_deref())
        .collect();

    let mut matrix = FeatureMatrix {
        genre_features: genres.len(),
        demographic_features: demographics.len(),
        ..Default::default()
    };

    matrix.names.push(SCORE_COLUMN.to_string());
    matrix.columns.push(records.iter().map(|r| r.score).collect());
    matrix.names.push(MEMBERS_COLUMN.to_string());
    matrix
        .columns
        .push(records.iter().map(ScoredRecord::members_f64).collect());

    for genre in &genres {
        matrix.names.push(genre.to_string());
        matrix.columns.push(
            records
                .iter()
                .map(|r| indicator(r.record.tags.labels().any(|l| l == *genre)))
                .collect(),
        );
    }
    for demographic in &demographics {
        matrix.names.push(format!("{}{}", DEMOGRAPHIC_PREFIX, demographic));
        matrix.columns.push(
            records
                .iter()
                .map(|r| indicator(r.record.demographic.as_deref() == Some(*demographic)))
                .collect(),
        );
    }

    debug!(
        genres = matrix.genre_features,
        demographics = matrix.demographic_features,
        "Encoded features"
    );
    matrix
}

fn indicator(present: bool) -> f64 {
    if present {
        1.0
    } else {
        0.0
    }
}

/// Correlation of one feature with a target metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Driver {
    pub feature: String,
    pub r: f64,
    pub strength: Strength,
}

/// Drivers of quality (score) and popularity (members)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationReport {
    /// Strongest positive correlations with score
    pub quality_drivers: Vec<Driver>,
    /// Weakest (most negative) correlations with score
    pub score_killers: Vec<Driver>,
    /// Strongest positive correlations with members
    pub popularity_drivers: Vec<Driver>,
    /// Weakest correlations with members
    pub popularity_detractors: Vec<Driver>,
}

/// Every defined correlation with `target`, descending by r then name
pub fn correlations_with(matrix: &FeatureMatrix, target: &str) -> Vec<Driver> {
    let Some(target_column) = matrix.column(target) else {
        return Vec::new();
    };
    let mut drivers: Vec<Driver> = matrix
        .names
        .iter()
        .zip(&matrix.columns)
        .filter_map(|(name, column)| {
            let r = stats::pearson(column, target_column)?;
            Some(Driver {
                feature: name.clone(),
                r,
                strength: Strength::of(r),
            })
        })
        .collect();
    drivers.sort_by(|a, b| b.r.total_cmp(&a.r).then_with(|| a.feature.cmp(&b.feature)));
    drivers
}

fn top_and_bottom(drivers: Vec<Driver>) -> (Vec<Driver>, Vec<Driver>) {
    let bottom_start = drivers.len().saturating_sub(BOTTOM_DRIVERS);
    let bottom = drivers[bottom_start..].to_vec();
    let top = drivers.into_iter().take(TOP_DRIVERS).collect();
    (top, bottom)
}

/// Quality and popularity drivers of the encoded records
pub fn analyze(matrix: &FeatureMatrix) -> CorrelationReport {
    let score_drivers: Vec<Driver> = correlations_with(matrix, SCORE_COLUMN)
        .into_iter()
        .filter(|d| d.feature != SCORE_COLUMN)
        .collect();
    let (quality_drivers, score_killers) = top_and_bottom(score_drivers);

    let members_drivers: Vec<Driver> = correlations_with(matrix, MEMBERS_COLUMN)
        .into_iter()
        .filter(|d| d.feature != SCORE_COLUMN && d.feature != MEMBERS_COLUMN)
        .collect();
    let (popularity_drivers, popularity_detractors) = top_and_bottom(members_drivers);

    CorrelationReport {
        quality_drivers,
        score_killers,
        popularity_drivers,
        popularity_detractors,
    }
}
