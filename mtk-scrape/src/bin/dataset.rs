//! mtk-dataset - record log conversion and dataset merging
//!
//! **Usage:**
//! ```bash
//! mtk-dataset convert <log.jsonl> <dataset.csv>
//! mtk-dataset merge -o <merged.csv> <a.csv> <b.csv> ...
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use mtk_common::dataset::{convert_log_to_csv, merge_datasets};

#[derive(Parser, Debug)]
#[clap(name = "mtk-dataset", version)]
#[clap(about = "Convert scraper logs to CSV and merge datasets")]
struct Args {
    /// Log level when RUST_LOG is unset
    #[clap(long, default_value = "info")]
    log_level: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// JSON lines record log to a CSV dataset sorted by id
    Convert {
        #[clap(value_name = "LOG")]
        input: PathBuf,
        #[clap(value_name = "CSV")]
        output: PathBuf,
    },
    /// Concatenate datasets, dropping duplicate ids (first wins)
    Merge {
        /// Merged dataset
        #[clap(long, short, value_name = "CSV")]
        output: PathBuf,
        #[clap(value_name = "CSV", required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    mtk_common::logging::init(&args.log_level);

    match args.command {
        Command::Convert { input, output } => {
            let summary = convert_log_to_csv(&input, &output)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            if summary.skipped > 0 {
                warn!(skipped = summary.skipped, "Skipped undecodable log lines");
            }
            info!(
                rows = summary.written,
                output = %output.display(),
                "Converted record log"
            );
        }
        Command::Merge { output, inputs } => {
            let summary = merge_datasets(&inputs, &output)
                .with_context(|| format!("Failed to merge into {}", output.display()))?;
            for missing in &summary.files_missing {
                warn!(file = %missing.display(), "File not found, skipped");
            }
            info!(
                files = summary.files_read,
                rows = summary.rows_read,
                malformed = summary.malformed,
                duplicates = summary.duplicates,
                written = summary.written,
                output = %output.display(),
                "Merged datasets"
            );
        }
    }

    Ok(())
}
