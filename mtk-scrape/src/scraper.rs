//! Random-sampling scrape loop
//!
//! One request at a time. Each iteration draws an id uniformly from
//! `[low_id, high_id]`, skips it when already known and otherwise asks the
//! [`MangaSource`]:
//!
//! - found: append to the record log, whitelist, count a success and reset
//!   the consecutive failure counter
//! - 404: blacklist permanently, pause `not_found_delay`
//! - 429: pause `rate_limit_delay` and retry the same id; nothing is counted
//! - anything else: one more consecutive failure; the run aborts once the
//!   counter exceeds `max_consecutive_failures`
//!
//! The run also ends when `target_count` successes are reached or every id
//! in the range is known.

use crate::client::MangaSource;
use crate::error::{Result, ScrapeError};
use crate::state::ScrapeState;
use chrono::{DateTime, Utc};
use mtk_common::config::ScrapeConfig;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetReached,
    FailureCeiling,
    RangeExhausted,
}

/// Counters of one run
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeSummary {
    pub successes: usize,
    pub not_found: usize,
    pub rate_limited: usize,
    /// Failures over the whole run, not only the last streak
    pub failures: usize,
    pub stop: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Pauses applied by the loop itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub not_found: Duration,
    pub rate_limited: Duration,
}

impl Delays {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            not_found: Duration::from_millis(config.not_found_delay_ms),
            rate_limited: Duration::from_millis(config.rate_limit_delay_ms),
        }
    }

    pub fn none() -> Self {
        Self {
            not_found: Duration::ZERO,
            rate_limited: Duration::ZERO,
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

pub struct Scraper<S, R> {
    source: S,
    state: ScrapeState,
    rng: R,
    low_id: i64,
    high_id: i64,
    target_count: usize,
    max_consecutive_failures: usize,
    delays: Delays,
}

impl<S: MangaSource, R: Rng> Scraper<S, R> {
    pub fn new(source: S, state: ScrapeState, config: &ScrapeConfig, rng: R) -> Self {
        Self {
            source,
            state,
            rng,
            low_id: config.low_id,
            high_id: config.high_id,
            target_count: config.target_count,
            max_consecutive_failures: config.max_consecutive_failures,
            delays: Delays::from_config(config),
        }
    }

    pub fn with_delays(mut self, delays: Delays) -> Self {
        self.delays = delays;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> &ScrapeState {
        &self.state
    }

    pub fn into_state(self) -> ScrapeState {
        self.state
    }

    fn range_size(&self) -> u64 {
        self.high_id.abs_diff(self.low_id).saturating_add(1)
    }

    /// Run until the target, the failure ceiling or range exhaustion
    ///
    /// Only state file errors end the run with `Err`.
    pub async fn run(&mut self) -> Result<ScrapeSummary> {
        let started_at = Utc::now();
        let range_size = self.range_size();
        let mut known = self.state.known_in_range(self.low_id, self.high_id);

        let mut successes = 0;
        let mut not_found = 0;
        let mut rate_limited = 0;
        let mut failures = 0;
        let mut consecutive_failures = 0;
        let mut retry: Option<i64> = None;

        info!(
            low = self.low_id,
            high = self.high_id,
            target = self.target_count,
            known,
            "Starting scrape"
        );

        let stop = loop {
            if successes >= self.target_count {
                break StopReason::TargetReached;
            }
            if known >= range_size {
                break StopReason::RangeExhausted;
            }

            let id = match retry.take() {
                Some(id) => id,
                None => self.rng.gen_range(self.low_id..=self.high_id),
            };
            if self.state.is_known(id) {
                continue;
            }

            debug!(id, "Checking id");
            match self.source.fetch(id).await {
                Ok(record) => {
                    self.state.record_success(id, &record)?;
                    known += 1;
                    successes += 1;
                    consecutive_failures = 0;
                    info!(
                        id,
                        title = record.title.as_deref().unwrap_or(""),
                        captured = successes,
                        "Captured"
                    );
                }
                Err(ScrapeError::NotFound(_)) => {
                    self.state.mark_not_found(id)?;
                    known += 1;
                    not_found += 1;
                    debug!(id, "Empty id, blacklisted");
                    pause(self.delays.not_found).await;
                }
                Err(ScrapeError::RateLimited) => {
                    rate_limited += 1;
                    warn!(delay = ?self.delays.rate_limited, "Rate limited, pausing");
                    pause(self.delays.rate_limited).await;
                    retry = Some(id);
                }
                Err(ScrapeError::State(e)) => return Err(ScrapeError::State(e)),
                Err(e) => {
                    failures += 1;
                    consecutive_failures += 1;
                    warn!(id, error = %e, consecutive = consecutive_failures, "Fetch failed");
                    if consecutive_failures > self.max_consecutive_failures {
                        break StopReason::FailureCeiling;
                    }
                }
            }
        };

        let summary = ScrapeSummary {
            successes,
            not_found,
            rate_limited,
            failures,
            stop,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            successes,
            not_found,
            rate_limited,
            failures,
            stop = ?stop,
            "Scrape finished"
        );
        Ok(summary)
    }
}
