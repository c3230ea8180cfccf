use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod mexc;
pub mod retry;

/// One instrument record from a ticker snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractTicker {
    pub symbol: String,
    pub last_price: f64,
    /// 24h quote volume in USD.
    pub volume24: f64,
}

impl ContractTicker {
    /// Lenient per-record parse. A record without a symbol is dropped here;
    /// missing or unparseable numeric fields become 0.0 and are skipped later
    /// by the window tracker's positive-price constraint.
    pub fn from_value(v: &Value) -> Option<Self> {
        let symbol = v.get("symbol")?.as_str()?.to_string();
        Some(Self {
            symbol,
            last_price: num_field(v, "lastPrice"),
            volume24: num_field(v, "volume24"),
        })
    }
}

fn num_field(v: &Value, key: &str) -> f64 {
    match v.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// The external market-data collaborator: one call returns the full snapshot
/// of instrument records, or a recoverable error.
#[async_trait]
pub trait TickerSource {
    async fn fetch_tickers(&self) -> Result<Vec<ContractTicker>>;
}
