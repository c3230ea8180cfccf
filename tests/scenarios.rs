//! Scenario tests: the documented alerting behaviors, driven end-to-end
//! through the monitor with a synthetic clock.

use splashmon::evaluator::Direction;
use splashmon::exchange::ContractTicker;
use splashmon::monitor::Monitor;
use splashmon::notify::{format_price, format_volume};
use splashmon::state::Config;

fn config(poll_secs: u64, window_secs: u64) -> Config {
    Config {
        threshold_pct: 7.0,
        observe_pct: 2.0,
        cooldown_secs: 60,
        min_volume_usd: 0.0,
        poll_secs,
        window_secs,
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

// ---------------------------------------------------------------------------
// A: a 7% range fires at the boundary
// ---------------------------------------------------------------------------
#[test]
fn scenario_a_seven_percent_range_fires() {
    let mut m = Monitor::new(config(10, 30));
    m.process_snapshot(&[tick("X_USDT", 100.0)], 1000);
    m.process_snapshot(&[tick("X_USDT", 107.0)], 1010);
    let alerts = m.process_snapshot(&[tick("X_USDT", 103.0)], 1020);

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].high, 107.0);
    assert_eq!(alerts[0].low, 100.0);
    assert!((alerts[0].move_pct - 7.0).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// B: 6.9% stays quiet but the window still resets
// ---------------------------------------------------------------------------
#[test]
fn scenario_b_below_threshold_resets_quietly() {
    let mut m = Monitor::new(config(10, 20));
    m.process_snapshot(&[tick("X_USDT", 100.0)], 1000);
    let alerts = m.process_snapshot(&[tick("X_USDT", 106.9)], 1010);

    assert!(alerts.is_empty());
    let w = m.window("X_USDT").expect("window exists");
    assert_eq!((w.high, w.low, w.last_price), (106.9, 106.9, 106.9));
}

// ---------------------------------------------------------------------------
// C: cooldown suppresses the middle boundary, releases the third
// ---------------------------------------------------------------------------
#[test]
fn scenario_c_cooldown_ordering() {
    // window == poll, so every cycle is a boundary.
    let mut m = Monitor::new(config(10, 10));
    m.seed(&[tick("X_USDT", 100.0)]);

    let first = m.process_snapshot(&[tick("X_USDT", 107.5)], 1000);
    assert_eq!(first.len(), 1, "first qualifying boundary fires");

    let second = m.process_snapshot(&[tick("X_USDT", 100.0)], 1030);
    assert!(second.is_empty(), "30s later: suppressed by 60s cooldown");

    let third = m.process_snapshot(&[tick("X_USDT", 107.5)], 1070);
    assert_eq!(third.len(), 1, "70s after the first fire: eligible again");

    assert_eq!(m.stats().alerts, 2);
}

// ---------------------------------------------------------------------------
// D: a zero-price record leaves the window untouched
// ---------------------------------------------------------------------------
#[test]
fn scenario_d_zero_price_is_ignored() {
    let mut m = Monitor::new(config(10, 30));
    m.process_snapshot(&[tick("X_USDT", 100.0)], 1000);
    let before = m.window("X_USDT").expect("window exists");

    let alerts = m.process_snapshot(&[tick("X_USDT", 0.0)], 1010);
    assert!(alerts.is_empty());
    assert_eq!(m.window("X_USDT").unwrap(), before);
    // The cycle itself still counted.
    assert_eq!(m.stats().cycles, 2);
}

// ---------------------------------------------------------------------------
// E: golden formatting
// ---------------------------------------------------------------------------
#[test]
fn scenario_e_golden_formatting() {
    assert_eq!(format_volume(1_500_000_000.0), "$1.50B");
    assert_eq!(format_price(0.0003421), "$0.000342");
}

// ---------------------------------------------------------------------------
// Direction heuristic surfaces in the fired alert
// ---------------------------------------------------------------------------
#[test]
fn scenario_direction_up_when_closing_on_high() {
    let mut m = Monitor::new(config(10, 20));
    m.process_snapshot(&[tick("X_USDT", 100.0)], 1000);
    let alerts = m.process_snapshot(&[tick("X_USDT", 108.0)], 1010);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].direction, Direction::Up);

    let mut m = Monitor::new(config(10, 30));
    m.process_snapshot(&[tick("X_USDT", 100.0)], 1000);
    m.process_snapshot(&[tick("X_USDT", 108.0)], 1010);
    let alerts = m.process_snapshot(&[tick("X_USDT", 101.0)], 1020);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].direction, Direction::Down);
}
