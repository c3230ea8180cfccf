use anyhow::{bail, Context, Result};

use splashmon::exchange::mexc::MexcFutures;
use splashmon::exchange::retry::{with_backoff, Backoff};
use splashmon::exchange::TickerSource;
use splashmon::logging::{log, obj, v_num, v_str, Level};
use splashmon::monitor::Monitor;
use splashmon::notify::TelegramSink;
use splashmon::state::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    cfg.validate()?;

    // Missing credentials are fatal before any network traffic.
    let sink = TelegramSink::from_config(&cfg)?;
    let source = MexcFutures::new(&cfg)?;

    log(
        Level::Info,
        "startup",
        obj(&[
            (
                "config",
                serde_json::from_str(&cfg.to_json()).unwrap_or(serde_json::Value::Null),
            ),
            ("config_hash", v_str(&cfg.config_hash())),
            ("boundary_ratio", v_num(cfg.boundary_ratio() as f64)),
        ]),
    );

    let first = with_backoff(&Backoff::default(), "initial ticker snapshot", || {
        source.fetch_tickers()
    })
    .await
    .context("unable to obtain an initial snapshot")?;

    let mut monitor = Monitor::new(cfg.clone());
    let seeded = monitor.seed(&first);
    if seeded == 0 {
        bail!(
            "no {}-quoted contracts in the initial snapshot ({} records)",
            cfg.quote_asset,
            first.len()
        );
    }
    log(
        Level::Info,
        "seeded",
        obj(&[
            ("contracts", v_num(first.len() as f64)),
            ("instruments", v_num(seeded as f64)),
            ("window_secs", v_num(cfg.window_secs as f64)),
            ("poll_secs", v_num(cfg.poll_secs as f64)),
        ]),
    );

    monitor.run(&source, &sink).await
}
