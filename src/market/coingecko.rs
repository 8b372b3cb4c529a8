use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use url::Url;

use crate::market::{PriceBatch, PriceRequest, PriceSource};
use crate::types::price::Price;
use crate::types::quote::Quote;

const SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// `{"bitcoin": {"usd": 104250.5}, ...}`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

#[derive(Clone, Debug)]
pub struct CoinGeckoSource {
    http: reqwest::Client,
    vs_currency: String,
}

impl CoinGeckoSource {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build coingecko http client")?;

        Ok(Self {
            http,
            vs_currency: "usd".to_string(),
        })
    }

    fn simple_price_url(&self, requests: &[PriceRequest]) -> Result<Url> {
        let ids = requests
            .iter()
            .map(|request| request.remote_symbol.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let mut url = Url::parse(SIMPLE_PRICE_URL).context("invalid coingecko url")?;
        url.query_pairs_mut()
            .append_pair("ids", &ids)
            .append_pair("vs_currencies", &self.vs_currency);

        Ok(url)
    }

    fn batch_from_response(&self, requests: &[PriceRequest], body: &SimplePriceResponse) -> PriceBatch {
        requests
            .iter()
            .map(|request| {
                let quote = body
                    .get(&request.remote_symbol)
                    .and_then(|prices| prices.get(&self.vs_currency))
                    .copied()
                    .and_then(Price::new)
                    .map(|price| Quote {
                        price,
                        source_symbol: request.remote_symbol.clone(),
                    });
                (request.symbol.clone(), quote)
            })
            .collect()
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn fetch(&self, requests: &[PriceRequest]) -> Result<PriceBatch> {
        if requests.is_empty() {
            return Ok(PriceBatch::new());
        }

        let resp = self
            .http
            .get(self.simple_price_url(requests)?)
            .header("Accept", "application/json")
            .send()
            .await
            .context("coingecko simple price GET failed")?;

        let status = resp.status();
        let text = resp.text().await.context("read response body failed")?;

        if !status.is_success() {
            bail!("coingecko http error {status}: {text}");
        }

        let body: SimplePriceResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, %text, "failed to parse coingecko JSON response");
                bail!("parse coingecko response JSON failed: {e}");
            }
        };

        Ok(self.batch_from_response(requests, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requests() -> Vec<PriceRequest> {
        vec![
            PriceRequest {
                symbol: "BTC".to_string(),
                remote_symbol: "bitcoin".to_string(),
            },
            PriceRequest {
                symbol: "ETH".to_string(),
                remote_symbol: "ethereum".to_string(),
            },
        ]
    }

    #[test]
    fn builds_query_with_all_ids() {
        let source = CoinGeckoSource::new().unwrap();
        let url = source.simple_price_url(&requests()).unwrap();

        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["ids"], "bitcoin,ethereum");
        assert_eq!(pairs["vs_currencies"], "usd");
    }

    #[test]
    fn missing_coin_maps_to_no_data() {
        let source = CoinGeckoSource::new().unwrap();
        let body: SimplePriceResponse =
            serde_json::from_str(r#"{"bitcoin":{"usd":104250.5}}"#).unwrap();

        let batch = source.batch_from_response(&requests(), &body);

        assert_eq!(batch["BTC"].as_ref().map(|q| q.price), Price::new(104250.5));
        assert_eq!(batch["ETH"], None);
    }
}
