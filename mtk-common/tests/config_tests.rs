//! Unit tests for configuration resolution and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate MTK_CONFIG are marked with #[serial]
//! to ensure they run sequentially, not in parallel.

use mtk_common::config::{
    load_toml_config, ConfigResolver, ConfigSource, TomlConfig, CONFIG_ENV_VAR,
};
use mtk_common::TagMatch;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    let file = write_config("[analysis]\ntop_n = 4\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let resolver = ConfigResolver::new(None);
    assert_eq!(resolver.resolve(), Some(file.path().to_path_buf()));
    assert_eq!(resolver.load().config.analysis.top_n, 4);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_overrides_env_var() {
    let env_file = write_config("[analysis]\ntop_n = 4\n");
    let cli_file = write_config("[analysis]\ntop_n = 9\n");
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let resolver = ConfigResolver::new(Some(cli_file.path().to_path_buf()));
    let loaded = resolver.load();
    assert_eq!(loaded.config.analysis.top_n, 9);
    assert_eq!(loaded.source, ConfigSource::File(cli_file.path().to_path_buf()));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_file_degrades_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let resolver = ConfigResolver::new(Some(PathBuf::from("/nonexistent/mtk/config.toml")));
    let loaded = resolver.load();
    assert_eq!(loaded.config, TomlConfig::default());
    assert!(loaded.is_fallback());
}

#[test]
#[serial]
fn test_malformed_file_degrades_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let file = write_config("this is = = not toml");
    let resolver = ConfigResolver::new(Some(file.path().to_path_buf()));
    let loaded = resolver.load();
    assert_eq!(loaded.config, TomlConfig::default());

    // The failure is kept so the binaries can warn once logging is up
    match loaded.source {
        ConfigSource::Fallback { path, error } => {
            assert_eq!(path, file.path());
            assert!(error.contains("Parse config"), "unexpected error: {}", error);
        }
        other => panic!("expected a fallback, got {:?}", other),
    }
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
[logging]
level = "debug"

[analysis]
input = "data/manga.csv"
min_support = 4
top_n = 10
tag_match = "exact"

[scrape]
base_url = "http://localhost:8080/v4"
data_file = "out/log.jsonl"
low_id = 100
high_id = 200
target_count = 5
request_delay_ms = 0
"#,
    );

    let config = load_toml_config(file.path()).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.analysis.input, PathBuf::from("data/manga.csv"));
    assert_eq!(config.analysis.tag_match, TagMatch::Exact);
    assert_eq!(config.scrape.base_url, "http://localhost:8080/v4");
    assert_eq!(config.scrape.low_id, 100);
    assert_eq!(config.scrape.request_delay_ms, 0);
    // Untouched fields keep defaults
    assert_eq!(config.scrape.rate_limit_delay_ms, 10_000);
    assert_eq!(config.scrape.bad_ids_file, PathBuf::from("bad_ids.txt"));
}

#[test]
fn test_load_reports_parse_errors() {
    let file = write_config("[scrape]\nlow_id = \"one\"\n");
    let err = load_toml_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Parse config"));
}
