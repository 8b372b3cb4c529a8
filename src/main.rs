mod board;
mod config;
mod futures;
mod market;
mod session;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::board::market_board::MarketBoard;
use crate::config::MarketConfig;
use crate::market::coingecko::CoinGeckoSource;
use crate::market::price_cache::PriceCache;
use crate::market::price_feed::PriceFeed;
use crate::market::yahoo::YahooChartSource;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Instrument table (YAML)
    #[arg(long, env = "MARKET_HOURS_CONFIG", default_value = "instruments.yml")]
    pub config: PathBuf,

    /// Only show these symbols; repeat for several
    #[arg(long = "symbol")]
    pub symbols: Vec<String>,

    /// Do not fetch prices
    #[arg(long)]
    pub offline: bool,

    /// Render a single board and exit
    #[arg(long)]
    pub once: bool,

    /// Evaluate at a fixed RFC 3339 instant instead of the system clock (implies --once)
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("market_hours=info".parse()?),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = MarketConfig::load(&args.config)?;
    config.retain_symbols(&args.symbols)?;

    let cache = PriceCache::shared(config.price_ttl());
    let feed = if args.offline {
        None
    } else {
        Some(PriceFeed::new(
            &config.instruments,
            config.futures.roll_days_before,
            cache.clone(),
            Arc::new(YahooChartSource::new()?),
            Arc::new(CoinGeckoSource::new()?),
        ))
    };

    let mut board = MarketBoard::new(config.instruments.clone());

    if args.once || args.at.is_some() {
        let now = args.at.unwrap_or_else(Utc::now);

        if let Some(feed) = &feed {
            if let Err(error) = feed.refresh(Utc::now()).await {
                warn!("price refresh failed: {error:#}");
            }
        }

        let prices = cache.read().await;
        println!("{}", board.tick(&prices, now));
        return Ok(());
    }

    if let Some(feed) = feed {
        tokio::spawn(feed.run(config.price_ttl()));
    }

    info!(
        instruments = config.instruments.len(),
        interval_ms = config.refresh.status_interval_ms,
        "starting market board"
    );

    let mut ticker = tokio::time::interval(config.status_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let text = {
                    let prices = cache.read().await;
                    board.tick(&prices, now)
                };
                println!("{CLEAR_SCREEN}{text}");
            }

            result = &mut shutdown => {
                if let Err(error) = result {
                    warn!("failed to listen for ctrl-c: {error}");
                }
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}
