use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use url::Url;

use crate::market::{PriceBatch, PriceRequest, PriceSource};
use crate::types::price::Price;
use crate::types::quote::Quote;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart/";

#[derive(Clone, Debug)]
pub struct YahooChartSource {
    http: reqwest::Client,
    base_url: Url,
}

impl YahooChartSource {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("market-hours/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build yahoo http client")?;

        Ok(Self {
            http,
            base_url: Url::parse(BASE_URL).context("invalid yahoo base url")?,
        })
    }

    fn chart_url(&self, remote_symbol: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("yahoo base url cannot have path segments"))?
            .pop_if_empty()
            .push(remote_symbol);

        Ok(url)
    }

    async fn fetch_one(&self, remote_symbol: &str) -> Result<Option<Quote>> {
        let url = self.chart_url(remote_symbol)?;

        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("yahoo chart GET failed for {remote_symbol}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("yahoo http error {status} for {remote_symbol}");
        }

        let chart: ChartResponse = resp
            .json()
            .await
            .with_context(|| format!("parse yahoo chart JSON failed for {remote_symbol}"))?;

        Ok(chart
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|result| quote_from_meta(&result.meta, remote_symbol)))
    }
}

#[async_trait]
impl PriceSource for YahooChartSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, requests: &[PriceRequest]) -> Result<PriceBatch> {
        let responses = join_all(
            requests
                .iter()
                .map(|request| self.fetch_one(&request.remote_symbol)),
        )
        .await;

        let mut batch = PriceBatch::with_capacity(requests.len());
        let mut failures = 0usize;

        for (request, response) in requests.iter().zip(responses) {
            let quote = match response {
                Ok(quote) => quote,
                Err(error) => {
                    failures += 1;
                    tracing::warn!(
                        symbol = %request.symbol,
                        remote_symbol = %request.remote_symbol,
                        "yahoo price fetch failed: {error:#}"
                    );
                    None
                }
            };
            batch.insert(request.symbol.clone(), quote);
        }

        if !requests.is_empty() && failures == requests.len() {
            bail!("all {failures} yahoo chart requests failed");
        }

        Ok(batch)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
}

/// Current price falls back to the previous close; a quote without any
/// previous close is treated as incomplete.
fn quote_from_meta(meta: &ChartMeta, remote_symbol: &str) -> Option<Quote> {
    let price = meta
        .regular_market_price
        .and_then(Price::new)
        .or_else(|| meta.previous_close.and_then(Price::new))?;

    meta.chart_previous_close
        .and_then(Price::new)
        .or_else(|| meta.previous_close.and_then(Price::new))?;

    Some(Quote {
        price,
        source_symbol: remote_symbol.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chart_meta() {
        let raw = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":6012.5,"chartPreviousClose":5990.1,"currency":"USD"}}],"error":null}}"#;
        let chart: ChartResponse = serde_json::from_str(raw).unwrap();
        let meta = &chart.chart.result.unwrap()[0].meta;

        let quote = quote_from_meta(meta, "^GSPC").unwrap();
        assert_eq!(Some(quote.price), Price::new(6012.5));
        assert_eq!(quote.source_symbol, "^GSPC");
    }

    #[test]
    fn falls_back_to_previous_close() {
        let meta = ChartMeta {
            regular_market_price: None,
            previous_close: Some(101.25),
            chart_previous_close: None,
        };
        assert_eq!(quote_from_meta(&meta, "QQQ").map(|q| q.price), Price::new(101.25));
    }

    #[test]
    fn missing_previous_close_is_no_data() {
        let meta = ChartMeta {
            regular_market_price: Some(99.0),
            ..ChartMeta::default()
        };
        assert!(quote_from_meta(&meta, "QQQ").is_none());
    }

    #[test]
    fn empty_result_is_tolerated() {
        let chart: ChartResponse =
            serde_json::from_str(r#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#).unwrap();
        assert!(chart.chart.result.is_none());
    }

    #[test]
    fn chart_url_encodes_the_symbol() {
        let source = YahooChartSource::new().unwrap();
        let url = source.chart_url("^GSPC").unwrap();

        assert!(url.as_str().starts_with(BASE_URL));
        assert!(url.path().ends_with("GSPC"));
        assert_eq!(url.path_segments().map(|segments| segments.count()), Some(4));
    }
}
