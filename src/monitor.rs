//! The monitoring core: one cooperative loop that fetches a snapshot,
//! folds it into per-instrument windows, and evaluates every window-to-poll
//! boundary. All per-instrument state lives here and is mutated sequentially;
//! nothing outside this struct touches it.

use anyhow::Result;
use tokio::time::{sleep, Duration, Instant};

use crate::evaluator::{is_boundary, Decision, Evaluator};
use crate::exchange::{ContractTicker, TickerSource};
use crate::logging::{log, obj, v_num, v_str, Level};
use crate::metrics::RunStats;
use crate::notify::{Alert, AlertSink};
use crate::registry::InstrumentRegistry;
use crate::state::{now_ts, Config};
use crate::window::{ObservationWindow, WindowTracker};

const MIN_SLEEP: Duration = Duration::from_millis(100);

pub struct Monitor {
    cfg: Config,
    registry: InstrumentRegistry,
    tracker: WindowTracker,
    evaluator: Evaluator,
    stats: RunStats,
}

impl Monitor {
    pub fn new(cfg: Config) -> Self {
        let registry = InstrumentRegistry::new(&cfg.quote_asset);
        let tracker = WindowTracker::new(cfg.min_volume_usd);
        let evaluator = Evaluator::new(cfg.threshold_pct, cfg.cooldown_secs);
        Self {
            cfg,
            registry,
            tracker,
            evaluator,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn tracked(&self) -> usize {
        self.registry.len()
    }

    pub fn window(&self, symbol: &str) -> Option<ObservationWindow> {
        self.tracker.get(symbol).copied()
    }

    /// Prime registry and windows from the initial snapshot so the first
    /// boundary evaluates a full window instead of a cold start. Returns the
    /// number of admitted instruments.
    pub fn seed(&mut self, tickers: &[ContractTicker]) -> usize {
        for t in tickers {
            if self.registry.register(&t.symbol).is_some() {
                let _ = self.tracker.ingest(&t.symbol, t.last_price, t.volume24);
            }
        }
        self.registry.len()
    }

    /// Fold one successful snapshot into the state: register, ingest, and on
    /// boundary cycles evaluate + reset every instrument present in the
    /// snapshot. Returns the alerts that fired.
    pub fn process_snapshot(&mut self, tickers: &[ContractTicker], now: u64) -> Vec<Alert> {
        self.stats.cycles += 1;
        let boundary = is_boundary(self.stats.cycles, self.cfg.boundary_ratio());
        let mut fired = Vec::new();

        for t in tickers {
            let Some(instrument) = self.registry.register(&t.symbol) else {
                continue;
            };
            let base = instrument.base.clone();

            if self
                .tracker
                .ingest(&t.symbol, t.last_price, t.volume24)
                .is_none()
            {
                continue;
            }
            if !boundary {
                continue;
            }
            let Some(window) = self.tracker.get(&t.symbol).copied() else {
                continue;
            };

            match self.evaluator.evaluate(&t.symbol, &window, now) {
                Decision::Fire { move_pct, direction } => {
                    self.stats.alerts += 1;
                    fired.push(Alert {
                        symbol: t.symbol.clone(),
                        base,
                        move_pct,
                        direction,
                        high: window.high,
                        low: window.low,
                        price: window.last_price,
                        volume24: window.last_volume,
                        ts: now,
                    });
                }
                Decision::Observe { move_pct, .. } => {
                    if self.cfg.show_moves
                        && (move_pct >= self.cfg.observe_pct || self.cfg.show_all_moves)
                    {
                        log(
                            Level::Info,
                            "move",
                            obj(&[
                                ("symbol", v_str(&t.symbol)),
                                ("move_pct", v_num(move_pct)),
                                ("high", v_num(window.high)),
                                ("low", v_num(window.low)),
                            ]),
                        );
                    }
                }
                Decision::Suppressed { move_pct } => {
                    log(
                        Level::Info,
                        "alert_suppressed",
                        obj(&[
                            ("symbol", v_str(&t.symbol)),
                            ("move_pct", v_num(move_pct)),
                            ("reason", v_str("cooldown")),
                        ]),
                    );
                }
                Decision::Skip => {}
            }

            // The boundary always resets the window, fired or not.
            self.tracker.reset(&t.symbol, window.last_price);
        }
        fired
    }

    /// One full cycle: fetch, process, dispatch. Returns whether the fetch
    /// succeeded, which decides the sleep policy.
    pub async fn run_cycle(
        &mut self,
        source: &(dyn TickerSource + Send + Sync),
        sink: &(dyn AlertSink + Send + Sync),
        now: u64,
    ) -> bool {
        match source.fetch_tickers().await {
            Ok(tickers) => {
                log(
                    Level::Debug,
                    "snapshot",
                    obj(&[("contracts", v_num(tickers.len() as f64))]),
                );
                let alerts = self.process_snapshot(&tickers, now);
                for alert in &alerts {
                    match sink.deliver(alert).await {
                        Ok(()) => log(
                            Level::Info,
                            "alert_sent",
                            obj(&[
                                ("symbol", v_str(&alert.symbol)),
                                ("move_pct", v_num(alert.move_pct)),
                            ]),
                        ),
                        // At-most-once: a failed dispatch is logged and lost.
                        Err(err) => log(
                            Level::Error,
                            "notify_failed",
                            obj(&[
                                ("symbol", v_str(&alert.symbol)),
                                ("error", v_str(&format!("{err:#}"))),
                            ]),
                        ),
                    }
                }
                if self.cfg.stats_every_cycles > 0
                    && self.stats.cycles % self.cfg.stats_every_cycles == 0
                {
                    self.log_stats("cycle_stats");
                }
                true
            }
            Err(err) => {
                self.stats.cycles += 1;
                self.stats.fetch_failures += 1;
                log(
                    Level::Error,
                    "fetch_failed",
                    obj(&[("error", v_str(&format!("{err:#}")))]),
                );
                false
            }
        }
    }

    /// Run until interrupted. A failed cycle sleeps a full poll interval; a
    /// successful one sleeps the remainder of the interval, clamped so
    /// processing overruns never invert the cadence.
    pub async fn run(
        &mut self,
        source: &(dyn TickerSource + Send + Sync),
        sink: &(dyn AlertSink + Send + Sync),
    ) -> Result<()> {
        let poll = Duration::from_secs(self.cfg.poll_secs);
        let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

        loop {
            let started = Instant::now();
            let fetched = self.run_cycle(source, sink, now_ts()).await;

            let wait = if fetched {
                poll.saturating_sub(started.elapsed()).max(MIN_SLEEP)
            } else {
                poll
            };

            tokio::select! {
                _ = &mut shutdown => {
                    log(Level::Info, "shutdown", obj(&[("reason", v_str("interrupt"))]));
                    self.log_stats("final_stats");
                    return Ok(());
                }
                _ = sleep(wait) => {}
            }
        }
    }

    fn log_stats(&self, event: &str) {
        log(
            Level::Info,
            event,
            obj(&[
                ("cycles", v_num(self.stats.cycles as f64)),
                ("alerts", v_num(self.stats.alerts as f64)),
                ("fetch_failures", v_num(self.stats.fetch_failures as f64)),
                ("tracked", v_num(self.registry.len() as f64)),
            ]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Direction;

    fn test_config() -> Config {
        Config {
            threshold_pct: 7.0,
            observe_pct: 2.0,
            cooldown_secs: 60,
            min_volume_usd: 0.0,
            poll_secs: 10,
            window_secs: 30,
            show_moves: false,
            show_all_moves: false,
            stats_every_cycles: 6,
            ticker_url: String::new(),
            quote_asset: "USDT".to_string(),
            display_utc_offset_hours: 3,
            telegram_token: None,
            telegram_chat_id: None,
            telegram_channel_url: None,
        }
    }

    fn tick(symbol: &str, price: f64) -> ContractTicker {
        ContractTicker {
            symbol: symbol.to_string(),
            last_price: price,
            volume24: 1_000_000.0,
        }
    }

    #[test]
    fn test_seed_admits_only_quote_matches() {
        let mut m = Monitor::new(test_config());
        let seeded = m.seed(&[tick("BTC_USDT", 100.0), tick("BTC_USDC", 50.0)]);
        assert_eq!(seeded, 1);
        assert!(m.window("BTC_USDT").is_some());
        assert!(m.window("BTC_USDC").is_none());
    }

    #[test]
    fn test_no_evaluation_before_boundary() {
        // ratio = 3: cycles 1 and 2 only accumulate.
        let mut m = Monitor::new(test_config());
        let a = m.process_snapshot(&[tick("BTC_USDT", 100.0)], 1000);
        let b = m.process_snapshot(&[tick("BTC_USDT", 120.0)], 1010);
        assert!(a.is_empty() && b.is_empty());
        let w = m.window("BTC_USDT").unwrap();
        assert_eq!(w.high, 120.0);
        assert_eq!(w.low, 100.0);
    }

    #[test]
    fn test_boundary_fires_and_resets() {
        let mut m = Monitor::new(test_config());
        m.process_snapshot(&[tick("BTC_USDT", 100.0)], 1000);
        m.process_snapshot(&[tick("BTC_USDT", 107.0)], 1010);
        let alerts = m.process_snapshot(&[tick("BTC_USDT", 103.0)], 1020);

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.base, "BTC");
        assert_eq!(alert.high, 107.0);
        assert_eq!(alert.low, 100.0);
        assert_eq!(alert.price, 103.0);
        assert_eq!(alert.direction, Direction::Down);
        assert!(alert.move_pct >= 7.0);

        // Window re-anchored on the last price.
        let w = m.window("BTC_USDT").unwrap();
        assert_eq!((w.high, w.low, w.last_price), (103.0, 103.0, 103.0));
        assert_eq!(m.stats().alerts, 1);
    }

    #[test]
    fn test_boundary_resets_even_without_fire() {
        let mut m = Monitor::new(test_config());
        m.process_snapshot(&[tick("BTC_USDT", 100.0)], 1000);
        m.process_snapshot(&[tick("BTC_USDT", 104.0)], 1010);
        let alerts = m.process_snapshot(&[tick("BTC_USDT", 102.0)], 1020);

        assert!(alerts.is_empty());
        let w = m.window("BTC_USDT").unwrap();
        assert_eq!((w.high, w.low, w.last_price), (102.0, 102.0, 102.0));
    }

    #[test]
    fn test_skipped_record_does_not_evaluate_stale_window() {
        let mut m = Monitor::new(test_config());
        m.process_snapshot(&[tick("BTC_USDT", 100.0)], 1000);
        m.process_snapshot(&[tick("BTC_USDT", 110.0)], 1010);
        // Boundary cycle carries an invalid price: the record is skipped and
        // the window survives untouched for the next boundary.
        let alerts = m.process_snapshot(&[tick("BTC_USDT", 0.0)], 1020);
        assert!(alerts.is_empty());
        let w = m.window("BTC_USDT").unwrap();
        assert_eq!(w.high, 110.0);
        assert_eq!(w.low, 100.0);
    }

    #[test]
    fn test_cycle_counter_and_discovery() {
        let mut m = Monitor::new(test_config());
        m.process_snapshot(&[tick("BTC_USDT", 100.0)], 1000);
        m.process_snapshot(&[tick("BTC_USDT", 100.0), tick("NEW_USDT", 1.0)], 1010);
        assert_eq!(m.stats().cycles, 2);
        assert_eq!(m.tracked(), 2);
    }
}
