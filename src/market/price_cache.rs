use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use crate::market::PriceBatch;
use crate::types::quote::Quote;

pub type SharedPriceCache = Arc<RwLock<PriceCache>>;

/// Last fetched prices, owned by the price feed and read by the board.
pub struct PriceCache {
    entries: HashMap<String, Option<Quote>>,
    last_fetch: Option<DateTime<Utc>>,
    ttl: TimeDelta,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            last_fetch: None,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn shared(ttl: Duration) -> SharedPriceCache {
        Arc::new(RwLock::new(Self::new(ttl)))
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.last_fetch {
            Some(last) => !self.entries.is_empty() && now - last < self.ttl,
            None => false,
        }
    }

    pub fn store(&mut self, batch: PriceBatch, fetched_at: DateTime<Utc>) {
        self.entries = batch;
        self.last_fetch = Some(fetched_at);
    }

    #[cfg(test)]
    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.entries.get(symbol).and_then(Option::as_ref)
    }

    /// Price text for the board: `Loading...` before the first answer for
    /// `symbol`, `No data` when the source had nothing usable.
    pub fn display(&self, symbol: &str, currency: &str) -> String {
        match self.entries.get(symbol) {
            None => "Loading...".to_string(),
            Some(None) => "No data".to_string(),
            Some(Some(quote)) => format!("{currency}{}", quote.price),
        }
    }

    pub fn last_updated(&self, now: DateTime<Utc>) -> String {
        let Some(last) = self.last_fetch else {
            return "Never".to_string();
        };

        let seconds_ago = (now - last).num_seconds().max(0);
        if seconds_ago < 60 {
            format!("{seconds_ago}s ago")
        } else if seconds_ago < 3600 {
            format!("{}m ago", seconds_ago / 60)
        } else {
            format!("{}h ago", seconds_ago / 3600)
        }
    }
}

impl fmt::Debug for PriceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceCache")
            .field("entries", &self.entries.len())
            .field("last_fetch", &self.last_fetch)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::price::Price;
    use chrono::TimeZone;

    fn quote(price: f64, source_symbol: &str) -> Option<Quote> {
        Some(Quote {
            price: Price::new(price).unwrap(),
            source_symbol: source_symbol.to_string(),
        })
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 14, 0, 0).unwrap()
    }

    #[test]
    fn empty_cache_is_stale_and_loading() {
        let cache = PriceCache::new(Duration::from_secs(60));

        assert!(!cache.is_fresh(t0()));
        assert_eq!(cache.display("SPX", "USD "), "Loading...");
        assert_eq!(cache.last_updated(t0()), "Never");
    }

    #[test]
    fn freshness_follows_ttl() {
        let mut cache = PriceCache::new(Duration::from_secs(60));
        cache.store(PriceBatch::from([("SPX".to_string(), quote(6000.0, "^GSPC"))]), t0());

        assert!(cache.is_fresh(t0() + TimeDelta::seconds(59)));
        assert!(!cache.is_fresh(t0() + TimeDelta::seconds(60)));
    }

    #[test]
    fn renders_prices_and_missing_data() {
        let mut cache = PriceCache::new(Duration::from_secs(60));
        cache.store(
            PriceBatch::from([
                ("SPX".to_string(), quote(6012.5, "^GSPC")),
                ("DXY".to_string(), None),
            ]),
            t0(),
        );

        assert_eq!(cache.display("SPX", "USD "), "USD 6,012.50");
        assert_eq!(cache.display("DXY", ""), "No data");
        assert_eq!(cache.display("HSI", "HK$"), "Loading...");
        assert_eq!(cache.quote("SPX").map(|q| q.source_symbol.as_str()), Some("^GSPC"));
    }

    #[test]
    fn last_updated_is_relative() {
        let mut cache = PriceCache::new(Duration::from_secs(60));
        cache.store(PriceBatch::new(), t0());

        assert_eq!(cache.last_updated(t0() + TimeDelta::seconds(42)), "42s ago");
        assert_eq!(cache.last_updated(t0() + TimeDelta::seconds(125)), "2m ago");
        assert_eq!(cache.last_updated(t0() + TimeDelta::seconds(7300)), "2h ago");
    }
}
