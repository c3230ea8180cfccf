use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::{ContractTicker, TickerSource};
use crate::state::Config;

#[derive(Deserialize)]
struct TickerEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// MEXC futures contract ticker source. One GET returns every contract's
/// snapshot inside a `{ success, data }` envelope.
pub struct MexcFutures {
    client: Client,
    ticker_url: String,
}

impl MexcFutures {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            ticker_url: cfg.ticker_url.clone(),
        })
    }
}

/// An absent or false `success` flag is a failed fetch, same as a transport
/// error. Individual malformed records are dropped, not errors.
fn parse_envelope(body: &str) -> Result<Vec<ContractTicker>> {
    let envelope: TickerEnvelope = serde_json::from_str(body).context("decode ticker response")?;
    if !envelope.success {
        bail!("ticker response reported success=false");
    }
    Ok(envelope
        .data
        .iter()
        .filter_map(ContractTicker::from_value)
        .collect())
}

#[async_trait::async_trait]
impl TickerSource for MexcFutures {
    async fn fetch_tickers(&self) -> Result<Vec<ContractTicker>> {
        let resp = self
            .client
            .get(&self.ticker_url)
            .send()
            .await
            .context("ticker request")?;
        let status = resp.status();
        let body = resp.text().await.context("read ticker body")?;
        if !status.is_success() {
            bail!("ticker request failed: {} - {}", status, body);
        }
        parse_envelope(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope_happy_path() {
        let body = r#"{
            "success": true,
            "data": [
                {"symbol": "BTC_USDT", "lastPrice": 64250.5, "volume24": 1200000000},
                {"symbol": "ETH_USDT", "lastPrice": "3120.44", "volume24": "5000000"},
                {"lastPrice": 1.0},
                {"symbol": "DOGE_USDT"}
            ]
        }"#;
        let tickers = parse_envelope(body).expect("parses");
        // The symbol-less record is dropped; the price-less one survives with 0.0.
        assert_eq!(tickers.len(), 3);
        assert_eq!(tickers[0].symbol, "BTC_USDT");
        assert_eq!(tickers[2].last_price, 0.0);
    }

    #[test]
    fn test_parse_envelope_success_false_is_error() {
        assert!(parse_envelope(r#"{"success": false, "data": []}"#).is_err());
    }

    #[test]
    fn test_parse_envelope_missing_success_is_error() {
        assert!(parse_envelope(r#"{"data": []}"#).is_err());
    }

    #[test]
    fn test_parse_envelope_garbage_is_error() {
        assert!(parse_envelope("<html>503</html>").is_err());
    }

    #[test]
    fn test_parse_envelope_empty_data() {
        let tickers = parse_envelope(r#"{"success": true}"#).expect("parses");
        assert!(tickers.is_empty());
    }
}
