use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::futures::roll::DEFAULT_ROLL_DAYS_BEFORE;
use crate::types::instrument::{Instrument, InstrumentConfig, normalize_symbol};

#[derive(Debug, Copy, Clone, Deserialize)]
pub struct RefreshConfig {
    /// How long fetched prices are served from cache
    #[serde(default = "default_price_ttl_secs")]
    pub price_ttl_secs: u64,

    /// Board re-render period
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            price_ttl_secs: default_price_ttl_secs(),
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

fn default_price_ttl_secs() -> u64 {
    60
}

fn default_status_interval_ms() -> u64 {
    1_000
}

#[derive(Debug, Copy, Clone, Deserialize)]
pub struct FuturesConfig {
    #[serde(default = "default_roll_days_before")]
    pub roll_days_before: i64,
}

impl Default for FuturesConfig {
    fn default() -> Self {
        Self {
            roll_days_before: DEFAULT_ROLL_DAYS_BEFORE,
        }
    }
}

fn default_roll_days_before() -> i64 {
    DEFAULT_ROLL_DAYS_BEFORE
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    refresh: RefreshConfig,
    #[serde(default)]
    futures: FuturesConfig,
    instruments: Vec<InstrumentConfig>,
}

/// Instrument table and refresh settings, validated once at startup.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub refresh: RefreshConfig,
    pub futures: FuturesConfig,
    pub instruments: Vec<Instrument>,
}

impl MarketConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read instrument table {}", path.display()))?;

        let config = Self::from_yaml(&raw)
            .with_context(|| format!("failed to load instrument table {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            instruments = config.instruments.len(),
            "loaded instrument table"
        );

        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(raw).context("failed to parse instrument table")?;

        Self::validate(&raw).context("instrument table validation failed")?;

        let instruments = raw
            .instruments
            .iter()
            .map(|instrument| {
                Instrument::from_config(instrument)
                    .with_context(|| format!("invalid instrument {}", instrument.symbol))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            refresh: raw.refresh,
            futures: raw.futures,
            instruments,
        })
    }

    fn validate(raw: &RawConfig) -> Result<()> {
        if raw.instruments.is_empty() {
            bail!("instruments must not be empty");
        }
        if raw.refresh.price_ttl_secs == 0 {
            bail!("refresh.price_ttl_secs must be > 0");
        }
        if raw.refresh.status_interval_ms == 0 {
            bail!("refresh.status_interval_ms must be > 0");
        }
        if raw.futures.roll_days_before < 0 {
            bail!("futures.roll_days_before must be >= 0");
        }

        let mut seen = HashSet::new();
        for instrument in &raw.instruments {
            if !seen.insert(normalize_symbol(&instrument.symbol)) {
                bail!("duplicate instrument symbol {}", instrument.symbol);
            }
        }
        Ok(())
    }

    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh.price_ttl_secs)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.refresh.status_interval_ms)
    }

    /// Keeps only the given symbols, in table order. Unknown symbols are an error.
    pub fn retain_symbols(&mut self, symbols: &[String]) -> Result<()> {
        if symbols.is_empty() {
            return Ok(());
        }

        let wanted: HashSet<String> = symbols.iter().map(|s| normalize_symbol(s)).collect();
        for symbol in &wanted {
            if !self.instruments.iter().any(|i| i.symbol() == symbol) {
                bail!("unknown instrument symbol {symbol}");
            }
        }

        self.instruments.retain(|i| wanted.contains(i.symbol()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
refresh:
  price_ttl_secs: 30
instruments:
  - symbol: SPX
    name: S&P 500 Index
    exchange: CBOE
    sector: Index
    currency: "USD "
    schedule:
      timezone: America/New_York
      trading_days: [1, 2, 3, 4, 5]
      kind: regular_session
      regular_open: "09:30"
      regular_close: "16:00"
    price: !yahoo "^GSPC"
  - symbol: BTC
    name: Bitcoin
    schedule:
      timezone: UTC
      kind: always_24x7
    price: !coingecko bitcoin
"#;

    #[test]
    fn loads_instruments_and_defaults() {
        let config = MarketConfig::from_yaml(TABLE).unwrap();

        assert_eq!(config.instruments.len(), 2);
        assert_eq!(config.price_ttl(), Duration::from_secs(30));
        assert_eq!(config.status_interval(), Duration::from_millis(1_000));
        assert_eq!(config.futures.roll_days_before, DEFAULT_ROLL_DAYS_BEFORE);
        assert_eq!(config.instruments[1].sector(), "Other");
    }

    #[test]
    fn invalid_instrument_fails_the_load() {
        let broken = TABLE.replace("      regular_open: \"09:30\"\n", "");
        let error = format!("{:#}", MarketConfig::from_yaml(&broken).unwrap_err());

        assert!(error.contains("SPX"), "{error}");
        assert!(error.contains("regular_open"), "{error}");
    }

    #[test]
    fn duplicate_symbols_are_rejected() {
        let duplicated = TABLE.replace("symbol: BTC", "symbol: spx");
        assert!(MarketConfig::from_yaml(&duplicated).is_err());
    }

    #[test]
    fn out_of_range_refresh_settings_are_rejected() {
        for (setting, expected) in [
            ("refresh:\n  price_ttl_secs: 0\n", "price_ttl_secs"),
            ("refresh:\n  status_interval_ms: 0\n", "status_interval_ms"),
            ("futures:\n  roll_days_before: -1\n", "roll_days_before"),
        ] {
            let table = TABLE.replacen("refresh:\n  price_ttl_secs: 30\n", setting, 1);
            let error = format!("{:#}", MarketConfig::from_yaml(&table).unwrap_err());
            assert!(error.contains(expected), "{error}");
        }
    }

    #[test]
    fn retains_requested_symbols() {
        let mut config = MarketConfig::from_yaml(TABLE).unwrap();
        config.retain_symbols(&[" btc ".to_string()]).unwrap();

        assert_eq!(config.instruments.len(), 1);
        assert_eq!(config.instruments[0].symbol(), "BTC");
        assert!(config.retain_symbols(&["DAX".to_string()]).is_err());
    }

    #[test]
    fn shipped_table_is_valid() {
        let raw = include_str!("../instruments.yml");
        let config = MarketConfig::from_yaml(raw).unwrap();

        assert_eq!(config.instruments.len(), 14);
    }
}
