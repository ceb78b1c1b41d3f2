//! BridgeMap CLI - query bridges visible in a map viewport
//!
//! Runs one viewport-settle cycle against a bridge inventory backend and
//! prints the resulting deduplicated records.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bridgemap::{
    FetchCoordinator, FilterSettings, HttpTileFetcher, RankingKey, ViewportBounds,
};

/// Ranking applied when the backend truncates results.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum RankingArg {
    /// Lowest structural rating first
    LowestRating,
    /// Highest average daily traffic first
    HighestAdt,
    /// Worst overall condition first
    WorstCondition,
}

impl From<RankingArg> for RankingKey {
    fn from(arg: RankingArg) -> Self {
        match arg {
            RankingArg::LowestRating => RankingKey::LowestRating,
            RankingArg::HighestAdt => RankingKey::HighestAdt,
            RankingArg::WorstCondition => RankingKey::WorstCondition,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "bridgemap", about = "Query bridges visible in a map viewport")]
struct Cli {
    /// Backend base URL
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,

    /// Southern edge of the viewport in degrees
    #[arg(long, allow_hyphen_values = true)]
    south: f64,

    /// Western edge of the viewport in degrees
    #[arg(long, allow_hyphen_values = true)]
    west: f64,

    /// Northern edge of the viewport in degrees
    #[arg(long, allow_hyphen_values = true)]
    north: f64,

    /// Eastern edge of the viewport in degrees
    #[arg(long, allow_hyphen_values = true)]
    east: f64,

    /// Map zoom level
    #[arg(long, short, default_value_t = 9)]
    zoom: u8,

    /// Result ranking
    #[arg(long, value_enum, default_value = "lowest-rating")]
    ranking: RankingArg,

    /// Maximum records per batch
    #[arg(long, default_value_t = 100)]
    limit: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let fetcher = match HttpTileFetcher::new(&cli.server) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            eprintln!("Failed to create fetcher: {e}");
            return ExitCode::FAILURE;
        }
    };

    let coordinator = FetchCoordinator::new(fetcher);
    coordinator.set_filters(FilterSettings::new(cli.ranking.into(), cli.limit));

    let bounds = ViewportBounds::from_edges(cli.south, cli.west, cli.north, cli.east);
    let outcome = match coordinator.on_viewport_settled(&bounds, cli.zoom).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Invalid viewport: {e}");
            return ExitCode::FAILURE;
        }
    };
    debug!(?outcome, "viewport settled");

    let entities = coordinator.entities();
    println!(
        "{} tiles requested, {} bridges in viewport",
        outcome.new_tiles,
        entities.len()
    );
    for entity in &entities {
        println!("{}  {:.5},{:.5}", entity.id, entity.lat, entity.lon);
    }

    ExitCode::SUCCESS
}
