use std::fmt;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::types::trading_hours::{InstrumentSchedule, ScheduleConfig};

/// Where a live price for an instrument comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSymbol {
    /// Yahoo chart ticker, e.g. `^GSPC`
    Yahoo(String),
    /// Futures root on Yahoo; the quarterly contract is resolved at fetch time
    YahooFutures(String),
    /// CoinGecko coin id, e.g. `bitcoin`
    Coingecko(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub exchange: String,
    #[serde(default = "default_sector")]
    pub sector: String,
    /// Prefix for rendered prices, e.g. "USD " or "HK$"
    #[serde(default)]
    pub currency: String,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub price: Option<PriceSymbol>,
}

fn default_sector() -> String {
    "Other".to_string()
}

/// Form every symbol lookup compares against: trimmed, upper case.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[derive(Clone)]
pub struct Instrument {
    name: String,
    exchange: String,
    sector: String,
    currency: String,
    schedule: InstrumentSchedule,
    price_symbol: Option<PriceSymbol>,
}

impl Instrument {
    pub fn new(
        name: String,
        exchange: String,
        sector: String,
        currency: String,
        schedule: InstrumentSchedule,
        price_symbol: Option<PriceSymbol>,
    ) -> Self {
        Self {
            name,
            exchange,
            sector,
            currency,
            schedule,
            price_symbol,
        }
    }

    pub fn from_config(config: &InstrumentConfig) -> Result<Self> {
        let symbol = normalize_symbol(&config.symbol);
        if symbol.is_empty() {
            bail!("instrument symbol must not be empty");
        }

        let schedule = InstrumentSchedule::from_config(&symbol, &config.schedule)
            .with_context(|| format!("invalid schedule for {symbol}"))?;

        Ok(Self::new(
            config.name.clone(),
            config.exchange.clone(),
            config.sector.clone(),
            config.currency.clone(),
            schedule,
            config.price.clone(),
        ))
    }

    pub fn symbol(&self) -> &str {
        self.schedule.symbol()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn sector(&self) -> &str {
        &self.sector
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn schedule(&self) -> &InstrumentSchedule {
        &self.schedule
    }

    pub fn price_symbol(&self) -> Option<&PriceSymbol> {
        self.price_symbol.as_ref()
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.symbol(), self.exchange)
    }
}

impl fmt::Debug for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instrument({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_sources_are_yaml_tags() {
        let sources: Vec<PriceSymbol> =
            serde_yaml::from_str("[!yahoo \"^GSPC\", !yahoo_futures ES, !coingecko bitcoin]").unwrap();

        assert_eq!(
            sources,
            vec![
                PriceSymbol::Yahoo("^GSPC".to_string()),
                PriceSymbol::YahooFutures("ES".to_string()),
                PriceSymbol::Coingecko("bitcoin".to_string()),
            ]
        );
    }

    #[test]
    fn symbols_are_trimmed_and_upper_cased() {
        let config: InstrumentConfig = serde_yaml::from_str(
            "symbol: \" es \"\nname: E-mini S&P 500\nschedule:\n  timezone: UTC\n  kind: always_24x7\n",
        )
        .unwrap();
        let instrument = Instrument::from_config(&config).unwrap();

        assert_eq!(normalize_symbol(" es "), "ES");
        assert_eq!(instrument.symbol(), "ES");
        assert_eq!(instrument.to_string(), "ES ()");
    }
}
