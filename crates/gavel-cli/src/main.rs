//! gavel CLI - run auction rooms from the command line
//!
//! `simulate` loads a JSON catalog, opens a room, fills it with bot
//! bidders and runs the auction to completion on the real clock, then
//! prints a summary and optionally writes the final report as JSON.

mod bots;
mod catalog;
mod report;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gavel_engine::AuctionHouse;
use gavel_types::{
    AuctionOrder, BidderId, EngineConfig, LotCategory, LotSource, RoomEvent, RoomSettings,
    to_crore,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use crate::bots::{BotProfile, run_bot};
use crate::catalog::JsonCatalog;

#[derive(Parser)]
#[command(name = "gavel")]
#[command(about = "Real-time auction rooms: simulate, validate catalogs, inspect config")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a room with bot bidders until the auction completes
    Simulate {
        /// Path to the JSON catalog
        #[arg(value_name = "CATALOG")]
        catalog: PathBuf,

        /// Engine config JSON (defaults are used when absent)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of bidders, owner included
        #[arg(short, long, default_value_t = 4)]
        bidders: usize,

        /// Seed for bot behaviour
        #[arg(long, default_value_t = 7)]
        seed: u64,

        /// Override the countdown tick length in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Override the pause between lots in milliseconds
        #[arg(long)]
        reveal_ms: Option<u64>,

        /// Shuffle the queue with this seed instead of catalog order
        #[arg(long, conflicts_with = "by_category")]
        shuffle: Option<u64>,

        /// Auction in category batches: batsman, bowler, all-rounder, keeper
        #[arg(long)]
        by_category: bool,

        /// End the auction after this many lots
        #[arg(long)]
        stop_after: Option<usize>,

        /// Write the final report here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Parse a catalog and print what it contains
    Validate {
        #[arg(value_name = "CATALOG")]
        catalog: PathBuf,
    },
    /// Print the default engine config as JSON
    DefaultConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Simulate {
            catalog,
            config,
            bidders,
            seed,
            tick_ms,
            reveal_ms,
            shuffle,
            by_category,
            stop_after,
            out,
        } => {
            let mut config = match config {
                Some(path) => EngineConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => EngineConfig::default(),
            };
            if let Some(ms) = tick_ms {
                config.timer.tick_interval = Duration::from_millis(ms);
            }
            if let Some(ms) = reveal_ms {
                config.timer.reveal_delay = Duration::from_millis(ms);
            }
            let order = if let Some(seed) = shuffle {
                AuctionOrder::Shuffled { seed }
            } else if by_category {
                AuctionOrder::Categories {
                    sequence: LotCategory::ALL.to_vec(),
                    shuffle_seed: None,
                }
            } else {
                AuctionOrder::AsLoaded
            };
            let settings = RoomSettings {
                max_bidders: bidders.max(1),
                auction_order: order,
                ..config.default_settings.clone()
            };
            let params = Simulation {
                catalog,
                bidders: bidders.max(1),
                seed,
                stop_after,
                out,
            };
            simulate(config, settings, params).await?;
        }
        Commands::Validate { catalog } => {
            let lots = JsonCatalog::new(&catalog)
                .load_lots()
                .with_context(|| format!("loading catalog {}", catalog.display()))?;
            print!(
                "{}",
                report::catalog_summary(&catalog.display().to_string(), &lots)
            );
        }
        Commands::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&EngineConfig::default())?);
        }
    }

    Ok(())
}

struct Simulation {
    catalog: PathBuf,
    bidders: usize,
    seed: u64,
    stop_after: Option<usize>,
    out: Option<PathBuf>,
}

async fn simulate(
    config: EngineConfig,
    settings: RoomSettings,
    params: Simulation,
) -> anyhow::Result<()> {
    let house = Arc::new(AuctionHouse::new(config)?);
    let owner = BidderId::new("bot-0");
    let catalog = JsonCatalog::new(&params.catalog);
    let increments = settings.bid_increments.clone();
    let (code, _) = house
        .create_room_from(owner.clone(), Some("Team 0".into()), Some(settings), &catalog)
        .await
        .with_context(|| format!("loading catalog {}", params.catalog.display()))?;

    let mut ids = vec![owner];
    for i in 1..params.bidders {
        let id = BidderId::new(format!("bot-{i}"));
        house
            .join_room(&code, id.clone(), Some(format!("Team {i}")))
            .await?;
        ids.push(id);
    }

    let think_time = house.config().timer.tick_interval * 3;
    let profile = BotProfile {
        appetite: 0.6,
        max_markup_tenths: 40,
        think_time,
        increments,
    };
    let mut bots = Vec::with_capacity(ids.len());
    for (i, id) in ids.into_iter().enumerate() {
        let events = house.subscribe(&code).await?;
        bots.push(tokio::spawn(run_bot(
            Arc::clone(&house),
            code.clone(),
            id,
            profile.clone(),
            params.seed.wrapping_add(i as u64),
            events,
        )));
    }

    let mut events = house.subscribe(&code).await?;
    house.start_auction(&code).await?;
    info!(room = %code, "Auction running");

    let mut resolved = 0usize;
    loop {
        let notification = match events.recv().await {
            Ok(notification) => notification,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        };
        match notification.event {
            RoomEvent::LotResolved { record } => {
                resolved += 1;
                match &record.winner_name {
                    Some(team) => info!(
                        "SOLD {} to {} for {} Cr",
                        record.lot.name,
                        team,
                        to_crore(record.final_price)
                    ),
                    None => info!("UNSOLD {}", record.lot.name),
                }
                if params.stop_after.is_some_and(|limit| resolved == limit) {
                    if let Err(err) = house.end_early(&code).await {
                        tracing::debug!(error = %err, "Auction already finished");
                    }
                }
            }
            RoomEvent::AuctionComplete { .. } => break,
            _ => {}
        }
    }
    for bot in bots {
        bot.await?;
    }

    let final_report = house.query_report(&code).await?;
    print!("{}", report::summary(&final_report));
    if let Some(path) = params.out {
        report::write_report(&path, &final_report)
            .with_context(|| format!("writing report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
