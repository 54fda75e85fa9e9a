//! Configuration loading and config file resolution
//!
//! All tools share one TOML file. Every section and field is optional; a
//! missing or unreadable file logs a warning and falls back to compiled
//! defaults rather than terminating.

use crate::tags::TagMatch;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "MTK_CONFIG";

/// Config file name inside the user config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub logging: LoggingConfig,
    pub analysis: AnalysisConfig,
    pub scrape: ScrapeConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when RUST_LOG is unset (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// CSV dataset to analyze
    pub input: PathBuf,
    /// Minimum matching records for a tag to be ranked
    pub min_support: usize,
    /// Number of entries shown in ranked report sections
    pub top_n: usize,
    /// Tag matching policy used by trend scoring
    pub tag_match: TagMatch,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("final_manga_dataset_clean.csv"),
            min_support: 3,
            top_n: 15,
            tag_match: TagMatch::Substring,
        }
    }
}

/// Scraper configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Jikan API base URL
    pub base_url: String,
    /// JSON lines record log
    pub data_file: PathBuf,
    /// Identifiers that returned 404 (never retried)
    pub bad_ids_file: PathBuf,
    /// Identifiers already captured
    pub good_ids_file: PathBuf,
    /// Lowest identifier drawn (inclusive)
    pub low_id: i64,
    /// Highest identifier drawn (inclusive)
    pub high_id: i64,
    /// Successful captures before the run stops
    pub target_count: usize,
    /// Consecutive failures tolerated before the run aborts
    pub max_consecutive_failures: usize,
    /// Pause between requests
    pub request_delay_ms: u64,
    /// Pause after a 404
    pub not_found_delay_ms: u64,
    /// Pause after a 429
    pub rate_limit_delay_ms: u64,
    /// HTTP request timeout
    pub timeout_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jikan.moe/v4".to_string(),
            data_file: PathBuf::from("manga_data_full.jsonl"),
            bad_ids_file: PathBuf::from("bad_ids.txt"),
            good_ids_file: PathBuf::from("good_ids.txt"),
            low_id: 1,
            high_id: 600_000,
            target_count: 500_000,
            max_consecutive_failures: 10_000,
            request_delay_ms: 1500,
            not_found_delay_ms: 1000,
            rate_limit_delay_ms: 10_000,
            timeout_secs: 10,
        }
    }
}

impl ScrapeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.low_id < 0 {
            return Err(Error::Config(format!(
                "scrape.low_id ({}) must not be negative",
                self.low_id
            )));
        }
        if self.low_id > self.high_id {
            return Err(Error::Config(format!(
                "scrape.low_id ({}) is greater than scrape.high_id ({})",
                self.low_id, self.high_id
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("scrape.base_url is empty".to_string()));
        }
        Ok(())
    }
}

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. User config directory
/// 4. None (compiled defaults)
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Path of the config file to load, if any
    pub fn resolve(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: User config directory, only when present
        default_config_path().filter(|p| p.exists())
    }

    /// Resolve and load, degrading to defaults on any failure
    ///
    /// Nothing is logged here: the binaries resolve the config before the
    /// subscriber exists, then report the outcome with [`LoadedConfig::log`].
    pub fn load(&self) -> LoadedConfig {
        match self.resolve() {
            Some(path) => match load_toml_config(&path) {
                Ok(config) => LoadedConfig {
                    config,
                    source: ConfigSource::File(path),
                },
                Err(e) => LoadedConfig {
                    config: TomlConfig::default(),
                    source: ConfigSource::Fallback {
                        path,
                        error: e.to_string(),
                    },
                },
            },
            None => LoadedConfig {
                config: TomlConfig::default(),
                source: ConfigSource::Defaults,
            },
        }
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// No config file found
    Defaults,
    File(PathBuf),
    /// A file was found but could not be read or parsed
    Fallback { path: PathBuf, error: String },
}

/// Result of [`ConfigResolver::load`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ConfigSource::Fallback { .. })
    }

    /// Report the outcome once logging is up
    pub fn log(&self) {
        match &self.source {
            ConfigSource::Defaults => info!("No config file found - using default configuration"),
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Fallback { path, error } => warn!(
                path = %path.display(),
                "{} - using default configuration",
                error
            ),
        }
    }
}

/// `<user config dir>/mtk/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mtk").join(CONFIG_FILE_NAME))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config {} failed: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.analysis.min_support, 3);
        assert_eq!(config.scrape.max_consecutive_failures, 10_000);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: TomlConfig = toml::from_str(
            "[analysis]\nmin_support = 5\ntag_match = \"exact\"\n\n[scrape]\nhigh_id = 100\n",
        )
        .unwrap();
        assert_eq!(config.analysis.min_support, 5);
        assert_eq!(config.analysis.tag_match, TagMatch::Exact);
        assert_eq!(config.analysis.top_n, 15);
        assert_eq!(config.scrape.high_id, 100);
        assert_eq!(config.scrape.low_id, 1);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_scrape_validate_rejects_inverted_range() {
        let config = ScrapeConfig {
            low_id: 10,
            high_id: 5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(ScrapeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_scrape_validate_rejects_negative_ids() {
        let config = ScrapeConfig {
            low_id: i64::MIN,
            high_id: 5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let zero = ScrapeConfig {
            low_id: 0,
            high_id: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn test_cli_path_wins() {
        let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/explicit.toml")));
        assert_eq!(resolver.resolve(), Some(PathBuf::from("/tmp/explicit.toml")));
    }
}
