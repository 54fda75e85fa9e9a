//! Statistical insights and the executive summary

use crate::demographics::DemographicSummary;
use crate::genres;
use crate::sanitize::{Sanitized, ScoredRecord};
use mtk_common::stats;
use serde::Serialize;

/// Titles quoted per outlier group
const OUTLIER_EXAMPLES: usize = 3;
/// IQR multiplier of the upper fence
const FENCE_FACTOR: f64 = 1.5;

/// How tightly quality and popularity move together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connection {
    Loose,
    Moderate,
    Strong,
}

impl Connection {
    pub fn of(r: f64) -> Self {
        if r.abs() < 0.3 {
            Connection::Loose
        } else if r.abs() > 0.5 {
            Connection::Strong
        } else {
            Connection::Moderate
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Connection::Loose => "loosely connected",
            Connection::Moderate => "moderately connected",
            Connection::Strong => "strongly connected",
        }
    }
}

/// Shape of the score distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Concentrated on high scores
    LeftSkewed,
    /// Concentrated on low scores
    RightSkewed,
    Symmetric,
}

impl Shape {
    pub fn of(skew: f64) -> Self {
        if skew < -0.5 {
            Shape::LeftSkewed
        } else if skew > 0.5 {
            Shape::RightSkewed
        } else {
            Shape::Symmetric
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Shape::LeftSkewed => "left-skewed (concentrated on high scores)",
            Shape::RightSkewed => "right-skewed (concentrated on low scores)",
            Shape::Symmetric => "fairly symmetric",
        }
    }
}

/// Records at or above the upper IQR fence of one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outliers {
    pub threshold: f64,
    pub count: usize,
    pub percent: f64,
    pub examples: Vec<String>,
}

impl Outliers {
    fn detect(records: &[ScoredRecord], metric: impl Fn(&ScoredRecord) -> f64) -> Self {
        let values: Vec<f64> = records.iter().map(&metric).collect();
        let q1 = stats::quantile(&values, 0.25).unwrap_or_default();
        let q3 = stats::quantile(&values, 0.75).unwrap_or_default();
        let threshold = q3 + FENCE_FACTOR * (q3 - q1);

        let above: Vec<&ScoredRecord> = records.iter().filter(|r| metric(*r) >= threshold).collect();
        let percent = if records.is_empty() {
            0.0
        } else {
            above.len() as f64 / records.len() as f64 * 100.0
        };
        Self {
            threshold,
            count: above.len(),
            percent,
            examples: above
                .iter()
                .take(OUTLIER_EXAMPLES)
                .map(|r| r.record.title.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticalInsights {
    pub score_members_r: Option<f64>,
    pub connection: Option<Connection>,
    pub score_skewness: Option<f64>,
    pub shape: Option<Shape>,
    pub exceptional_quality: Outliers,
    pub viral_popularity: Outliers,
}

pub fn statistical_insights(sanitized: &Sanitized) -> StatisticalInsights {
    let scores = sanitized.scores();
    let r = stats::pearson(&scores, &sanitized.members());
    let skew = stats::skewness(&scores);

    StatisticalInsights {
        score_members_r: r,
        connection: r.map(Connection::of),
        score_skewness: skew,
        shape: skew.map(Shape::of),
        exceptional_quality: Outliers::detect(&sanitized.records, |r| r.score),
        viral_popularity: Outliers::detect(&sanitized.records, ScoredRecord::members_f64),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveSummary {
    pub total_records: usize,
    pub dropped_records: usize,
    pub avg_score: f64,
    pub score_range: (f64, f64),
    pub avg_members: f64,
    pub members_range: (f64, f64),
    pub unique_genres: usize,
    pub most_common_genre: Option<String>,
    pub demographics: usize,
    pub best_demographic: Option<String>,
}

/// `demographics` is expected highest mean score first
pub fn executive_summary(
    sanitized: &Sanitized,
    demographics: &[DemographicSummary],
) -> ExecutiveSummary {
    let counts = genres::label_counts(&sanitized.records);

    ExecutiveSummary {
        total_records: sanitized.records.len(),
        dropped_records: sanitized.dropped,
        avg_score: sanitized.score.mean,
        score_range: (sanitized.score.min, sanitized.score.max),
        avg_members: sanitized.members.mean,
        members_range: (sanitized.members.min, sanitized.members.max),
        unique_genres: counts.len(),
        most_common_genre: counts.first().map(|(genre, _)| genre.clone()),
        demographics: demographics.len(),
        best_demographic: demographics.first().map(|d| d.demographic.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics;
    use crate::sanitize::sanitize;
    use mtk_common::{Record, Tags};

    fn record(id: i64, score: f64, members: u64, demo: Option<&str>, tags: &str) -> Record {
        Record {
            id,
            title: format!("Title {}", id),
            score: Some(score),
            members: Some(members),
            demographic: demo.map(str::to_string),
            tags: Tags::from_raw(tags),
        }
    }

    fn sample() -> Sanitized {
        let mut records: Vec<Record> = (1..=9)
            .map(|i| record(i, 7.0 + (i % 3) as f64 * 0.1, 1000 + i as u64, Some("Shounen"), "Action"))
            .collect();
        records.push(record(10, 9.8, 250_000, Some("Seinen"), "Drama, Action"));
        records.push(record(11, 7.1, 1000, None, ""));
        records.push(Record {
            score: None,
            ..record(12, 0.0, 5, None, "")
        });
        sanitize(records).unwrap()
    }

    #[test]
    fn test_interpretation_thresholds() {
        assert_eq!(Connection::of(0.29), Connection::Loose);
        assert_eq!(Connection::of(-0.6), Connection::Strong);
        assert_eq!(Connection::of(0.5), Connection::Moderate);
        assert_eq!(Shape::of(-0.51), Shape::LeftSkewed);
        assert_eq!(Shape::of(0.5), Shape::Symmetric);
        assert_eq!(Shape::of(1.2), Shape::RightSkewed);
    }

    #[test]
    fn test_outliers_above_upper_fence() {
        let insights = statistical_insights(&sample());

        assert_eq!(insights.exceptional_quality.count, 1);
        assert_eq!(insights.exceptional_quality.examples, vec!["Title 10"]);
        assert_eq!(insights.viral_popularity.count, 1);
        assert!((insights.viral_popularity.percent - 100.0 / 11.0).abs() < 1e-9);
        assert_eq!(insights.connection, Some(Connection::Strong));
        assert_eq!(insights.shape, Some(Shape::RightSkewed));
    }

    #[test]
    fn test_executive_summary() {
        let sanitized = sample();
        let demos = demographics::summarize(&sanitized.records);
        let summary = executive_summary(&sanitized, &demos);

        assert_eq!(summary.total_records, 11);
        assert_eq!(summary.dropped_records, 1);
        assert_eq!(summary.unique_genres, 2);
        assert_eq!(summary.most_common_genre.as_deref(), Some("Action"));
        assert_eq!(summary.demographics, 2);
        assert_eq!(summary.best_demographic.as_deref(), Some("Seinen"));
        assert_eq!(summary.score_range.1, 9.8);
    }
}
