//! Error types for mtk-analyze

use thiserror::Error;

/// Main error type for the analysis pipeline
#[derive(Error, Debug)]
pub enum AnalyzeError {
    /// No record survived sanitization, so quartiles and means are undefined
    #[error("No records with both score and members ({dropped} dropped)")]
    EmptyDataset { dropped: usize },

    /// Dataset loading or report export failure
    #[error(transparent)]
    Common(#[from] mtk_common::Error),
}

/// Convenience Result type using AnalyzeError
pub type Result<T> = std::result::Result<T, AnalyzeError>;
