//! Error types for mtk-scrape

use thiserror::Error;

/// Scraper errors
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Manga not found: {0}")]
    NotFound(i64),

    #[error("Rate limit exceeded")]
    RateLimited,

    /// Record log or id list could not be read or written
    #[error("State error: {0}")]
    State(#[from] mtk_common::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
