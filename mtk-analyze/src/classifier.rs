//! Quality vs popularity classification
//!
//! Each record is assigned exactly one [`Category`] from the quartiles of
//! `score` and `members` over the whole population. The rules are evaluated
//! in a fixed order and the first match wins, because the conditions
//! overlap:
//!
//! | # | score            | members                        | category           |
//! |---|------------------|--------------------------------|--------------------|
//! | 1 | `>= score_p75`   | `>= members_p75`               | Masterpiece        |
//! | 2 | `>= score_p75`   | `< members_p25`                | Cult Classic       |
//! | 3 | `< score_p25`    | `>= members_p75`               | Viral Hit          |
//! | 4 | `>= score_p75`   | `>= members_p25`, `< members_p75` | Quality Hidden Gem |
//! | 5 | otherwise        |                                | Average            |
//!
//! Quartile ties are common with discrete data, so the inclusive/exclusive
//! bounds above are exact.

use crate::sanitize::ScoredRecord;
use mtk_common::stats;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Number of example titles listed per category
const EXAMPLE_TITLES: usize = 2;

/// Quality/popularity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    #[serde(rename = "Masterpiece")]
    Masterpiece,
    #[serde(rename = "Cult Classic")]
    CultClassic,
    #[serde(rename = "Viral Hit")]
    ViralHit,
    #[serde(rename = "Quality Hidden Gem")]
    QualityHiddenGem,
    #[serde(rename = "Average")]
    Average,
}

impl Category {
    /// All categories in rule precedence order
    pub const ALL: [Category; 5] = [
        Category::Masterpiece,
        Category::CultClassic,
        Category::ViralHit,
        Category::QualityHiddenGem,
        Category::Average,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Masterpiece => "Masterpiece",
            Category::CultClassic => "Cult Classic",
            Category::ViralHit => "Viral Hit",
            Category::QualityHiddenGem => "Quality Hidden Gem",
            Category::Average => "Average",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification cut points, computed once over the full population
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub score_p25: f64,
    pub score_p75: f64,
    pub members_p25: f64,
    pub members_p75: f64,
}

impl Quartiles {
    /// Quartiles of a non-empty population
    pub fn from_population(records: &[ScoredRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let mut scores: Vec<f64> = records.iter().map(|r| r.score).collect();
        let mut members: Vec<f64> = records.iter().map(ScoredRecord::members_f64).collect();
        scores.sort_by(f64::total_cmp);
        members.sort_by(f64::total_cmp);

        Some(Self {
            score_p25: stats::quantile_sorted(&scores, 0.25),
            score_p75: stats::quantile_sorted(&scores, 0.75),
            members_p25: stats::quantile_sorted(&members, 0.25),
            members_p75: stats::quantile_sorted(&members, 0.75),
        })
    }
}

/// Assign the category of one record
pub fn classify(score: f64, members: u64, q: &Quartiles) -> Category {
    let members = members as f64;
    let high_score = score >= q.score_p75;

    if high_score && members >= q.members_p75 {
        Category::Masterpiece
    } else if high_score && members < q.members_p25 {
        Category::CultClassic
    } else if score < q.score_p25 && members >= q.members_p75 {
        Category::ViralHit
    } else if high_score && members >= q.members_p25 && members < q.members_p75 {
        Category::QualityHiddenGem
    } else {
        Category::Average
    }
}

/// Size of one category relative to the population
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub count: usize,
    pub percent: f64,
}

/// Characteristics of the records in one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryProfile {
    pub category: Category,
    pub count: usize,
    pub avg_score: f64,
    pub avg_members: f64,
    /// Highest scored titles, best first
    pub top_titles: Vec<String>,
}

/// Classification of a whole population
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub quartiles: Quartiles,
    /// Category per record, parallel to the input slice
    #[serde(skip)]
    pub assignments: Vec<Category>,
    /// Non-empty categories, largest first
    pub distribution: Vec<CategoryShare>,
    /// Non-empty categories in precedence order
    pub profiles: Vec<CategoryProfile>,
}

impl Classification {
    pub fn count(&self, category: Category) -> usize {
        self.assignments.iter().filter(|c| **c == category).count()
    }
}

/// Classify every record and summarize the categories
pub fn classify_all(records: &[ScoredRecord], quartiles: Quartiles) -> Classification {
    let assignments: Vec<Category> = records
        .iter()
        .map(|r| classify(r.score, r.members, &quartiles))
        .collect();

    let total = records.len();
    let mut distribution = Vec::new();
    let mut profiles = Vec::new();

    for category in Category::ALL {
        let mut members_of: Vec<&ScoredRecord> = records
            .iter()
            .zip(&assignments)
            .filter(|(_, c)| **c == category)
            .map(|(r, _)| r)
            .collect();
        if members_of.is_empty() {
            continue;
        }
        let count = members_of.len();
        let scores: Vec<f64> = members_of.iter().map(|r| r.score).collect();
        let members: Vec<f64> = members_of.iter().map(|r| r.members_f64()).collect();

        // Stable sort keeps dataset order among equal scores
        members_of.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        let top_titles = members_of
            .iter()
            .take(EXAMPLE_TITLES)
            .map(|r| r.record.title.clone())
            .collect();

        distribution.push(CategoryShare {
            category,
            count,
            percent: count as f64 / total as f64 * 100.0,
        });
        profiles.push(CategoryProfile {
            category,
            count,
            avg_score: stats::mean(&scores).unwrap_or_default(),
            avg_members: stats::mean(&members).unwrap_or_default(),
            top_titles,
        });
    }

    // Largest first; precedence order among equal counts
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));

    debug!(
        ?quartiles,
        categories = distribution.len(),
        "Classification complete"
    );

    Classification {
        quartiles,
        assignments,
        distribution,
        profiles,
    }
}
