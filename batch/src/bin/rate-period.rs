//! Applies one rating period: reads a rating store and a game record file,
//! updates every player once, writes the next period's rating store.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fideglicko2_batch::chain::run_single;
use fideglicko2_batch::config::RatingConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rate-period",
    about = "Apply one Glicko-2 rating period to a rating store"
)]
struct Opt {
    /// Rating store for the period being processed.
    ratings_in: PathBuf,
    /// Game record file for the period. A missing file is a valid
    /// decay-only pass.
    games_in: PathBuf,
    /// Output rating store, input of the following period.
    ratings_out: PathBuf,
    /// Rating system parameters (TOML). Reference parameters when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opt = Opt::parse();
    let config = match &opt.config {
        Some(path) => RatingConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RatingConfig::default(),
    };
    let system = config.to_system();

    let summary = run_single(&system, &opt.ratings_in, &opt.games_in, &opt.ratings_out)
        .context("rating period failed")?;

    println!(
        "{} players updated, {} games applied, {} games skipped, {} malformed records, {} volatility fallbacks",
        summary.players,
        summary.rated_games,
        summary.skipped_games,
        summary.malformed_records,
        summary.volatility_fallbacks,
    );
    Ok(())
}
