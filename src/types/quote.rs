use crate::types::price::Price;

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price: Price,
    /// Ticker the price was fetched under, e.g. `ESZ26` or `bitcoin`
    pub source_symbol: String,
}
