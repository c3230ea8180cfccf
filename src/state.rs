use anyhow::{bail, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Clone, Debug, Serialize)]
pub struct Config {
    /// Window move percentage at which an alert fires.
    pub threshold_pct: f64,
    /// Informational threshold for logging sub-alert moves.
    pub observe_pct: f64,
    pub cooldown_secs: u64,
    /// Minimum 24h volume in USD; 0 disables the filter.
    pub min_volume_usd: f64,
    pub poll_secs: u64,
    /// Observation window length; must be an integer multiple of `poll_secs`.
    pub window_secs: u64,
    pub show_moves: bool,
    pub show_all_moves: bool,
    pub stats_every_cycles: u64,
    pub ticker_url: String,
    pub quote_asset: String,
    pub display_utc_offset_hours: i32,
    #[serde(skip)]
    pub telegram_token: Option<String>,
    #[serde(skip)]
    pub telegram_chat_id: Option<String>,
    pub telegram_channel_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            threshold_pct: std::env::var("MOVE_THRESHOLD_PCT").ok().and_then(|v| v.parse().ok()).unwrap_or(7.0),
            observe_pct: std::env::var("OBSERVE_THRESHOLD_PCT").ok().and_then(|v| v.parse().ok()).unwrap_or(2.0),
            cooldown_secs: std::env::var("COOLDOWN_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(60),
            min_volume_usd: std::env::var("MIN_VOLUME_USD").ok().and_then(|v| v.parse().ok()).unwrap_or(0.0),
            poll_secs: std::env::var("POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            window_secs: std::env::var("WINDOW_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(60),
            show_moves: std::env::var("SHOW_MOVES").map(|v| parse_bool(&v)).unwrap_or(true),
            show_all_moves: std::env::var("SHOW_ALL_MOVES").map(|v| parse_bool(&v)).unwrap_or(false),
            stats_every_cycles: std::env::var("STATS_EVERY_CYCLES").ok().and_then(|v| v.parse().ok()).unwrap_or(6),
            ticker_url: std::env::var("MEXC_TICKER_URL").unwrap_or_else(|_| "https://contract.mexc.com/api/v1/contract/ticker".to_string()),
            quote_asset: std::env::var("QUOTE_ASSET").unwrap_or_else(|_| "USDT".to_string()),
            display_utc_offset_hours: std::env::var("DISPLAY_UTC_OFFSET_HOURS").ok().and_then(|v| v.parse().ok()).unwrap_or(3),
            telegram_token: std::env::var("TELEGRAM_BOT_TOKEN").ok().filter(|v| !v.is_empty()),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID").ok().filter(|v| !v.is_empty()),
            telegram_channel_url: std::env::var("TELEGRAM_CHANNEL_URL").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Startup sanity checks. Violations are fatal configuration errors.
    pub fn validate(&self) -> Result<()> {
        if self.poll_secs == 0 {
            bail!("POLL_SECS must be positive");
        }
        if self.window_secs < self.poll_secs || self.window_secs % self.poll_secs != 0 {
            bail!(
                "WINDOW_SECS ({}) must be an integer multiple of POLL_SECS ({})",
                self.window_secs,
                self.poll_secs
            );
        }
        if self.threshold_pct <= 0.0 {
            bail!("MOVE_THRESHOLD_PCT must be positive");
        }
        Ok(())
    }

    /// Poll cycles per observation window.
    pub fn boundary_ratio(&self) -> u64 {
        self.window_secs / self.poll_secs
    }

    /// Canonical JSON of the non-secret fields, for the startup banner.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// SHA256 over the canonical JSON. Secrets are excluded, so the hash is
    /// safe to log and stable across hosts with the same tuning.
    pub fn config_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_json().as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")
}

pub fn now_ts() -> u64 {
    chrono::Utc::now().timestamp() as u64
}
