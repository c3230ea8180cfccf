use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use serde_json::json;

use crate::evaluator::Direction;
use crate::state::Config;

/// Everything the sink needs to render one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub symbol: String,
    pub base: String,
    pub move_pct: f64,
    pub direction: Direction,
    pub high: f64,
    pub low: f64,
    pub price: f64,
    pub volume24: f64,
    pub ts: u64,
}

/// The external notification collaborator. Delivery is best-effort and
/// at-most-once; the caller logs and drops errors.
#[async_trait]
pub trait AlertSink {
    async fn deliver(&self, alert: &Alert) -> Result<()>;
}

/// Dollar price with bracketed precision: thousands get separators and two
/// decimals, mid-range two decimals, sub-dollar six.
pub fn format_price(p: f64) -> String {
    if p >= 1000.0 {
        format!("${}", thousands(p))
    } else if p >= 1.0 {
        format!("${:.2}", p)
    } else {
        format!("${:.6}", p)
    }
}

fn thousands(p: f64) -> String {
    let s = format!("{:.2}", p);
    let (int_part, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let mut out = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{}.{}", out, frac)
}

/// 24h volume with B/M/K suffixes.
pub fn format_volume(v: f64) -> String {
    if v >= 1e9 {
        format!("${:.2}B", v / 1e9)
    } else if v >= 1e6 {
        format!("${:.2}M", v / 1e6)
    } else if v >= 1e3 {
        format!("${:.2}K", v / 1e3)
    } else {
        format!("${:.2}", v)
    }
}

/// Wall-clock time in the configured display offset, e.g. `14:03:09 UTC+3`.
pub fn format_local_time(ts: u64, offset_hours: i32) -> String {
    let secs = offset_hours.clamp(-23, 23) * 3600;
    let Some(offset) = FixedOffset::east_opt(secs) else {
        return ts.to_string();
    };
    match DateTime::<Utc>::from_timestamp(ts as i64, 0) {
        Some(dt) => format!(
            "{} UTC{:+}",
            dt.with_timezone(&offset).format("%H:%M:%S"),
            offset_hours
        ),
        None => ts.to_string(),
    }
}

pub fn trade_link(alert: &Alert) -> String {
    format!(
        "https://www.mexc.com/futures/{}?type=linear_swap",
        alert.symbol
    )
}

pub fn format_alert(alert: &Alert, offset_hours: i32) -> String {
    let (glyph, move_str) = match alert.direction {
        Direction::Up => ("🟢", format!("+{:.2}%", alert.move_pct)),
        Direction::Down => ("🔴", format!("-{:.2}%", alert.move_pct)),
    };
    format!(
        "🚨 MEXC SPLASH 🚨\n\
         \n\
         ───◇───────────────\n\
         🔖 Token: ${base}\n\
         📊 Move:     {glyph} {move_str}\n\
         \n\
         MAX: {high}\n\
         MIN: {low}\n\
         \n\
         💵 Price:     {price}\n\
         📦 Volume 24h: {volume}\n\
         ⏰ Time:    {time}\n\
         ───◇───────────────",
        base = alert.base,
        glyph = glyph,
        move_str = move_str,
        high = format_price(alert.high),
        low = format_price(alert.low),
        price = format_price(alert.price),
        volume = format_volume(alert.volume24),
        time = format_local_time(alert.ts, offset_hours),
    )
}

/// Telegram `sendMessage` sink with an inline keyboard: the trade deep link,
/// plus an optional configured channel link.
pub struct TelegramSink {
    client: Client,
    token: String,
    chat_id: String,
    channel_url: Option<String>,
    offset_hours: i32,
}

impl TelegramSink {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let token = cfg
            .telegram_token
            .clone()
            .context("TELEGRAM_BOT_TOKEN is not set")?;
        let chat_id = cfg
            .telegram_chat_id
            .clone()
            .context("TELEGRAM_CHAT_ID is not set")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build telegram client")?;
        Ok(Self {
            client,
            token,
            chat_id,
            channel_url: cfg.telegram_channel_url.clone(),
            offset_hours: cfg.display_utc_offset_hours,
        })
    }

    fn keyboard(&self, alert: &Alert) -> serde_json::Value {
        let mut rows = vec![json!([{ "text": "🔗 MEXC Futures", "url": trade_link(alert) }])];
        if let Some(url) = &self.channel_url {
            rows.push(json!([{ "text": "📢 Channel", "url": url }]));
        }
        json!({ "inline_keyboard": rows })
    }
}

#[async_trait]
impl AlertSink for TelegramSink {
    async fn deliver(&self, alert: &Alert) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": format_alert(alert, self.offset_hours),
            "parse_mode": "HTML",
            "reply_markup": self.keyboard(alert),
        });
        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("telegram request")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("telegram sendMessage failed: {} - {}", status, body);
        }
        Ok(())
    }
}
