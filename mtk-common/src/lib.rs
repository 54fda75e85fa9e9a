//! # MTK Common Library
//!
//! Shared code for the Manga Trend Kit tools including:
//! - Record model and tag matching policy
//! - Dataset IO (CSV dataset, JSONL record log)
//! - Descriptive statistics helpers
//! - Configuration loading
//! - Logging initialization

pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod record;
pub mod stats;
pub mod tags;

pub use error::{Error, Result};
pub use record::Record;
pub use tags::{TagMatch, Tags};
