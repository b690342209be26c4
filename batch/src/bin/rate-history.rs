//! Replays a chain of rating periods for one time-control category, feeding
//! each period's output rating store to the next period.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fideglicko2_batch::chain::{Category, Chain, DataLayout, Period};
use fideglicko2_batch::config::RatingConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rate-history",
    about = "Replay chained Glicko-2 rating periods over a data directory"
)]
struct Opt {
    /// Base data directory holding rating_lists/ and clean_numerical/.
    #[arg(long, value_name = "DIR")]
    data_dir: PathBuf,
    /// Time-control category to process.
    #[arg(long)]
    category: Category,
    /// First period to process. Its rating store must exist (or be seeded
    /// with --seed-from).
    #[arg(long, value_name = "YYYY-MM")]
    from: Period,
    /// Last period to process, inclusive.
    #[arg(long, value_name = "YYYY-MM")]
    to: Period,
    /// Copy this category's rating store at the first period into the
    /// processed category before running. One-time branch initialization,
    /// e.g. seeding Rapid and Blitz from Standard at 2011-12.
    #[arg(long, value_name = "CATEGORY")]
    seed_from: Option<Category>,
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

    let chain = Chain::new(&system, DataLayout::new(&opt.data_dir));
    if let Some(seed_from) = opt.seed_from {
        chain
            .seed_category(seed_from, opt.category, opt.from)
            .with_context(|| format!("seeding {} from {}", opt.category, seed_from))?;
    }
    chain
        .run(opt.category, opt.from, opt.to)
        .with_context(|| format!("rating chain for {} failed", opt.category))?;

    Ok(())
}
