use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::market::price_cache::PriceCache;
use crate::session::calculator::evaluate;
use crate::types::instrument::Instrument;
use crate::types::trading_status::TradingStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRow {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub sector: String,
    pub price: String,
    pub status: TradingStatus,
    pub countdown: String,
}

/// Text table of every instrument's status, recomputed from scratch each tick.
pub struct MarketBoard {
    instruments: Vec<Instrument>,
    last_open: HashMap<String, bool>,
}

impl MarketBoard {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        Self {
            instruments,
            last_open: HashMap::new(),
        }
    }

    pub fn rows(&self, prices: &PriceCache, now: DateTime<Utc>) -> Vec<BoardRow> {
        self.instruments
            .iter()
            .map(|instrument| {
                let status = evaluate(instrument.schedule(), now);
                BoardRow {
                    symbol: instrument.symbol().to_string(),
                    name: instrument.name().to_string(),
                    exchange: instrument.exchange().to_string(),
                    sector: instrument.sector().to_string(),
                    price: prices.display(instrument.symbol(), instrument.currency()),
                    countdown: countdown_text(&status),
                    status,
                }
            })
            .collect()
    }

    /// Renders the board and logs every instrument whose open/closed state
    /// changed since the previous tick.
    pub fn tick(&mut self, prices: &PriceCache, now: DateTime<Utc>) -> String {
        let rows = self.rows(prices, now);

        for row in &rows {
            let previous = self.last_open.insert(row.symbol.clone(), row.status.is_open);
            if previous.is_some_and(|was_open| was_open != row.status.is_open) {
                tracing::info!(
                    symbol = %row.symbol,
                    status = row.status.label(),
                    next = %row.countdown,
                    "market status changed"
                );
            }
        }

        render(&rows, &prices.last_updated(now))
    }
}

fn countdown_text(status: &TradingStatus) -> String {
    match status.next_boundary {
        Some(countdown) => countdown.to_string(),
        None if status.is_open => "—".to_string(),
        None => "N/A".to_string(),
    }
}

pub fn render(rows: &[BoardRow], last_updated: &str) -> String {
    let header = format!(
        "{:<6} {:<24} {:<10} {:<10} {:>16} {:<7} {:>12}",
        "SYMBOL", "NAME", "EXCHANGE", "SECTOR", "PRICE", "STATUS", "NEXT"
    );

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(header);
    lines.extend(rows.iter().map(|row| {
        format!(
            "{:<6} {:<24} {:<10} {:<10} {:>16} {:<7} {:>12}",
            row.symbol,
            row.name,
            row.exchange,
            row.sector,
            row.price,
            row.status.label(),
            row.countdown
        )
    }));
    lines.push(format!("prices updated: {last_updated}"));

    lines.join("\n")
}
