//! mtk-scrape - random-sampling Jikan scraper
//!
//! **Usage:**
//! ```bash
//! mtk-scrape [--config <file>] [--low-id N] [--high-id N] [--target N] [--seed N]
//! ```
//!
//! Safe to interrupt: captured records and ids are flushed as they arrive.

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::{info, warn};

use mtk_common::config::ConfigResolver;
use mtk_scrape::{JikanClient, ScrapeState, Scraper};

/// Collect manga records from the Jikan API
#[derive(Parser, Debug)]
#[clap(name = "mtk-scrape", version)]
#[clap(about = "Sample MAL ids at random and append Jikan records to a JSON lines log")]
struct Args {
    /// Config file (overrides MTK_CONFIG and the user config dir)
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lowest id drawn (inclusive)
    #[clap(long)]
    low_id: Option<i64>,

    /// Highest id drawn (inclusive)
    #[clap(long)]
    high_id: Option<i64>,

    /// Successful captures before stopping
    #[clap(long)]
    target: Option<usize>,

    /// JSON lines record log
    #[clap(long, value_name = "FILE")]
    data_file: Option<PathBuf>,

    /// Seed for the id sampler (random when omitted)
    #[clap(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let loaded = ConfigResolver::new(args.config.clone()).load();

    mtk_common::logging::init(&loaded.config.logging.level);

    info!(
        "Starting mtk-scrape v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    loaded.log();
    let config = loaded.config;

    let mut scrape = config.scrape;
    if let Some(low_id) = args.low_id {
        scrape.low_id = low_id;
    }
    if let Some(high_id) = args.high_id {
        scrape.high_id = high_id;
    }
    if let Some(target) = args.target {
        scrape.target_count = target;
    }
    if let Some(data_file) = args.data_file {
        scrape.data_file = data_file;
    }
    scrape.validate().context("Invalid scrape configuration")?;

    let client = JikanClient::new(&scrape).context("Failed to create Jikan client")?;
    let state = ScrapeState::open(&scrape).context("Failed to open scrape state")?;
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut scraper = Scraper::new(client, state, &scrape, rng);

    tokio::select! {
        result = scraper.run() => {
            let summary = result.context("Scrape aborted")?;
            info!(
                successes = summary.successes,
                not_found = summary.not_found,
                stop = ?summary.stop,
                "Job done"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, state is saved up to the last completed request");
        }
    }

    Ok(())
}
