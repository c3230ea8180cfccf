use std::collections::HashMap;

use crate::window::ObservationWindow;

/// Display-only direction hint: a window that closed on its high is shown as
/// an upward move, anything else as downward. The move percentage itself only
/// measures range magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Window cannot be evaluated (division guard).
    Skip,
    /// Below the alert threshold.
    Observe { move_pct: f64, direction: Direction },
    /// Alert; the evaluator has already stamped the cooldown clock.
    Fire { move_pct: f64, direction: Direction },
    /// Above threshold but inside the per-instrument cooldown.
    Suppressed { move_pct: f64 },
}

/// A cycle is a window boundary when the free-running cycle counter lands on
/// a multiple of the window-to-poll ratio.
pub fn is_boundary(cycle: u64, ratio: u64) -> bool {
    ratio > 0 && cycle % ratio == 0
}

pub struct Evaluator {
    threshold_pct: f64,
    cooldown_secs: u64,
    last_alert: HashMap<String, u64>,
}

impl Evaluator {
    pub fn new(threshold_pct: f64, cooldown_secs: u64) -> Self {
        Self {
            threshold_pct,
            cooldown_secs,
            last_alert: HashMap::new(),
        }
    }

    /// Judge one window at a boundary. Firing records the alert time before
    /// returning, so a second evaluation at the same instant is suppressed
    /// rather than double-fired.
    pub fn evaluate(&mut self, symbol: &str, window: &ObservationWindow, now_ts: u64) -> Decision {
        if window.low <= 0.0 {
            return Decision::Skip;
        }
        let move_pct = (window.high - window.low) / window.low * 100.0;
        let direction = if window.last_price >= window.high {
            Direction::Up
        } else {
            Direction::Down
        };

        if move_pct >= self.threshold_pct {
            if let Some(&last) = self.last_alert.get(symbol) {
                if now_ts.saturating_sub(last) < self.cooldown_secs {
                    return Decision::Suppressed { move_pct };
                }
            }
            self.last_alert.insert(symbol.to_string(), now_ts);
            return Decision::Fire { move_pct, direction };
        }
        Decision::Observe { move_pct, direction }
    }

    pub fn last_alert_ts(&self, symbol: &str) -> Option<u64> {
        self.last_alert.get(symbol).copied()
    }
}
