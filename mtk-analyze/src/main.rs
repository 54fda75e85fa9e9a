//! mtk-analyze - manga dataset trend analysis
//!
//! **Usage:**
//! ```bash
//! mtk-analyze [--config <file>] [--input <csv>] [--min-support N] [--top-n N]
//!             [--tag-match substring|exact] [--export <file>]
//! ```
//!
//! Prints the text report on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;

use mtk_common::config::ConfigResolver;
use mtk_common::TagMatch;

/// Quality/popularity classification and genre trend report
#[derive(Parser, Debug)]
#[clap(name = "mtk-analyze", version)]
#[clap(about = "Analyze a manga dataset and print a trend report")]
struct Args {
    /// Config file (overrides MTK_CONFIG and the user config dir)
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dataset CSV to analyze
    #[clap(long, short, value_name = "CSV")]
    input: Option<PathBuf>,

    /// Minimum matching records for a tag to be ranked
    #[clap(long)]
    min_support: Option<usize>,

    /// Number of trends listed in the report
    #[clap(long)]
    top_n: Option<usize>,

    /// Tag matching policy: substring, substring-case-sensitive or exact
    #[clap(long)]
    tag_match: Option<TagMatch>,

    /// Export the report to a JSON file
    #[clap(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let loaded = ConfigResolver::new(args.config.clone()).load();

    mtk_common::logging::init(&loaded.config.logging.level);

    info!(
        "Starting mtk-analyze v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.log();
    let config = loaded.config;

    let mut analysis = config.analysis;
    if let Some(input) = args.input {
        analysis.input = input;
    }
    if let Some(min_support) = args.min_support {
        analysis.min_support = min_support;
    }
    if let Some(top_n) = args.top_n {
        analysis.top_n = top_n;
    }
    if let Some(tag_match) = args.tag_match {
        analysis.tag_match = tag_match;
    }

    let report = mtk_analyze::pipeline::run(&analysis)
        .with_context(|| format!("Analysis of {} failed", analysis.input.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report.render(&mut out).context("Failed to write report")?;
    out.flush()?;

    if let Some(path) = args.export {
        report
            .export_json(&path)
            .with_context(|| format!("Failed to export report to {}", path.display()))?;
        info!(path = %path.display(), "Exported JSON report");
    }

    Ok(())
}
