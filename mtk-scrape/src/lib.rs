//! Jikan scraper for the manga dataset
//!
//! Samples MAL ids at random, appends captured records to a JSON lines log
//! and remembers empty and captured ids across runs.

pub mod client;
pub mod error;
pub mod scraper;
pub mod state;

pub use client::{JikanClient, MangaSource};
pub use error::{Result, ScrapeError};
pub use scraper::{Delays, ScrapeSummary, Scraper, StopReason};
pub use state::ScrapeState;
