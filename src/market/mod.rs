pub mod coingecko;
pub mod price_cache;
pub mod price_feed;
pub mod yahoo;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::quote::Quote;

/// One price to fetch: the board symbol and the ticker the remote API knows it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRequest {
    pub symbol: String,
    pub remote_symbol: String,
}

/// Fetched prices keyed by board symbol. `None` marks a symbol the source
/// answered for but had no usable price.
pub type PriceBatch = HashMap<String, Option<Quote>>;

#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, requests: &[PriceRequest]) -> Result<PriceBatch>;
}
