use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::time::MissedTickBehavior;

use crate::futures::roll::active_contract;
use crate::market::price_cache::SharedPriceCache;
use crate::market::{PriceBatch, PriceRequest, PriceSource};
use crate::types::instrument::{Instrument, PriceSymbol};

pub type DynamicPriceSource = Arc<dyn PriceSource>;

#[derive(Debug, Clone)]
struct PriceTarget {
    symbol: String,
    timezone: Tz,
    price_symbol: PriceSymbol,
}

/// Refreshes the shared price cache from the configured sources.
pub struct PriceFeed {
    targets: Vec<PriceTarget>,
    yahoo: DynamicPriceSource,
    coingecko: DynamicPriceSource,
    roll_days_before: i64,
    cache: SharedPriceCache,
}

impl PriceFeed {
    pub fn new(
        instruments: &[Instrument],
        roll_days_before: i64,
        cache: SharedPriceCache,
        yahoo: DynamicPriceSource,
        coingecko: DynamicPriceSource,
    ) -> Self {
        let targets = instruments
            .iter()
            .filter_map(|instrument| {
                instrument.price_symbol().map(|price_symbol| PriceTarget {
                    symbol: instrument.symbol().to_string(),
                    timezone: instrument.schedule().timezone(),
                    price_symbol: price_symbol.clone(),
                })
            })
            .collect();

        Self {
            targets,
            yahoo,
            coingecko,
            roll_days_before,
            cache,
        }
    }

    /// Splits targets per source; futures roots resolve to the contract
    /// active on the exchange's local date.
    fn requests(&self, now: DateTime<Utc>) -> (Vec<PriceRequest>, Vec<PriceRequest>) {
        let mut yahoo = Vec::new();
        let mut coingecko = Vec::new();

        for target in &self.targets {
            let symbol = target.symbol.clone();
            match &target.price_symbol {
                PriceSymbol::Yahoo(ticker) => yahoo.push(PriceRequest {
                    symbol,
                    remote_symbol: ticker.clone(),
                }),
                PriceSymbol::YahooFutures(root) => {
                    let today = now.with_timezone(&target.timezone).date_naive();
                    let contract = active_contract(root, today, self.roll_days_before);
                    tracing::debug!(
                        symbol = %target.symbol,
                        contract = %contract,
                        expiry = ?contract.expiry(),
                        "resolved futures contract"
                    );
                    yahoo.push(PriceRequest {
                        symbol,
                        remote_symbol: contract.to_string(),
                    });
                }
                PriceSymbol::Coingecko(id) => coingecko.push(PriceRequest {
                    symbol,
                    remote_symbol: id.clone(),
                }),
            }
        }

        (yahoo, coingecko)
    }

    /// Fetches unless the cache is still fresh. Returns whether the cache was
    /// updated. When every source fails the previous prices are kept.
    pub async fn refresh(&self, now: DateTime<Utc>) -> Result<bool> {
        if self.cache.read().await.is_fresh(now) {
            tracing::trace!("price cache still fresh");
            return Ok(false);
        }

        let (yahoo_requests, coingecko_requests) = self.requests(now);

        let (yahoo, coingecko) = tokio::join!(
            fetch_from(self.yahoo.as_ref(), &yahoo_requests),
            fetch_from(self.coingecko.as_ref(), &coingecko_requests),
        );

        let attempted = [&yahoo_requests, &coingecko_requests]
            .iter()
            .filter(|requests| !requests.is_empty())
            .count();
        let failed = [&yahoo, &coingecko].iter().filter(|r| r.is_err()).count();

        if attempted > 0 && failed == attempted {
            bail!("every price source failed; keeping previous prices");
        }

        let mut batch = PriceBatch::new();
        for (result, requests) in [(yahoo, &yahoo_requests), (coingecko, &coingecko_requests)] {
            match result {
                Ok(prices) => batch.extend(prices),
                Err(_) => batch.extend(requests.iter().map(|r| (r.symbol.clone(), None))),
            }
        }

        let priced = batch.values().filter(|quote| quote.is_some()).count();
        tracing::info!(symbols = batch.len(), priced, "price cache refreshed");

        self.cache.write().await.store(batch, now);
        Ok(true)
    }

    pub async fn run(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if let Err(error) = self.refresh(Utc::now()).await {
                tracing::warn!("price refresh failed: {error:#}");
            }
        }
    }
}

async fn fetch_from(source: &dyn PriceSource, requests: &[PriceRequest]) -> Result<PriceBatch> {
    if requests.is_empty() {
        return Ok(PriceBatch::new());
    }

    let result = source.fetch(requests).await;
    if let Err(error) = &result {
        tracing::warn!(source = source.name(), "price source failed: {error:#}");
    }
    result
}
