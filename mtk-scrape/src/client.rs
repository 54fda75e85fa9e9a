//! Jikan API client
//!
//! `GET {base_url}/manga/{id}/full` with a fixed user agent, a request
//! timeout and a minimum interval between requests.

use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use mtk_common::config::ScrapeConfig;
use mtk_common::dataset::{LogRecord, UNKNOWN_DEMOGRAPHIC};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("mtk-scrape/", env!("CARGO_PKG_VERSION"));

/// Source of manga records keyed by MAL id
///
/// Errors carry the outcome: [`ScrapeError::NotFound`] and
/// [`ScrapeError::RateLimited`] are expected answers, anything else is a
/// failure.
#[async_trait]
pub trait MangaSource: Send + Sync {
    async fn fetch(&self, id: i64) -> Result<LogRecord>;
}

/// `{"data": {...}}` envelope of the `/manga/{id}/full` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct JikanResponse {
    pub data: JikanManga,
}

/// Fields of a Jikan manga entry kept in the record log
///
/// Jikan sends `null` for absent lists, so they are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JikanManga {
    pub mal_id: Option<i64>,
    pub title: Option<String>,
    pub title_english: Option<String>,
    pub score: Option<f64>,
    pub members: Option<u64>,
    pub demographics: Option<Vec<JikanEntity>>,
    pub genres: Option<Vec<JikanEntity>>,
    pub themes: Option<Vec<JikanEntity>>,
}

/// Named MAL entity (genre, theme, demographic)
#[derive(Debug, Clone, Deserialize)]
pub struct JikanEntity {
    pub name: String,
}

impl JikanManga {
    /// English title when present, romanized title otherwise; genres before themes
    pub fn into_log_record(self, requested_id: i64) -> LogRecord {
        let title = self
            .title_english
            .filter(|t| !t.trim().is_empty())
            .or(self.title);
        let demographic = self
            .demographics
            .and_then(|d| d.into_iter().next())
            .map(|d| d.name)
            .unwrap_or_else(|| UNKNOWN_DEMOGRAPHIC.to_string());
        let tags = self
            .genres
            .unwrap_or_default()
            .into_iter()
            .chain(self.themes.unwrap_or_default())
            .map(|e| e.name)
            .collect();

        LogRecord {
            id: Some(self.mal_id.unwrap_or(requested_id)),
            title,
            score: self.score,
            members: self.members,
            demographic: Some(demographic),
            tags,
        }
    }
}

/// At most one request per `request_delay_ms`; `None` when the delay is zero
fn request_limiter(delay_ms: u64) -> Option<DefaultDirectRateLimiter> {
    Quota::with_period(Duration::from_millis(delay_ms)).map(RateLimiter::direct)
}

/// Jikan v4 client
pub struct JikanClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: Option<DefaultDirectRateLimiter>,
}

impl JikanClient {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter: request_limiter(config.request_delay_ms),
        })
    }

    pub fn manga_url(&self, id: i64) -> String {
        format!("{}/manga/{}/full", self.base_url, id)
    }
}

#[async_trait]
impl MangaSource for JikanClient {
    async fn fetch(&self, id: i64) -> Result<LogRecord> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let url = self.manga_url(id);
        tracing::debug!(id, url = %url, "Querying Jikan API");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            return Err(ScrapeError::NotFound(id));
        }

        if status == 429 {
            return Err(ScrapeError::RateLimited);
        }

        if status != 200 {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Api(status.as_u16(), error_text));
        }

        let body: JikanResponse = response
            .json()
            .await
            .map_err(|e| ScrapeError::Parse(e.to_string()))?;

        Ok(body.data.into_log_record(id))
    }
}
