//! Manga dataset analysis
//!
//! Classifies records by quality and popularity, ranks genre trends and
//! derives correlation, demographic and recommendation summaries from a CSV
//! dataset. [`pipeline::run`] drives the whole analysis.

pub mod classifier;
pub mod correlation;
pub mod demographics;
pub mod error;
pub mod genres;
pub mod insights;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod sanitize;
pub mod trend;

pub use classifier::{classify, Category, Quartiles};
pub use error::{AnalyzeError, Result};
pub use report::AnalysisReport;
pub use trend::{trend_strength, TrendRanking, TrendScorer};
