use std::collections::HashMap;

/// Per-instrument high/low accumulation since the last window reset.
///
/// Invariant: `low <= last_price <= high` — each ingested price can only push
/// high/low outward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationWindow {
    pub high: f64,
    pub low: f64,
    pub last_price: f64,
    pub last_volume: f64,
}

pub struct WindowTracker {
    windows: HashMap<String, ObservationWindow>,
    min_volume_usd: f64,
}

impl WindowTracker {
    pub fn new(min_volume_usd: f64) -> Self {
        Self {
            windows: HashMap::new(),
            min_volume_usd,
        }
    }

    /// Fold one ticker record into the instrument's window.
    ///
    /// Non-positive or non-finite prices are skipped without touching state;
    /// so are records below the volume floor when one is configured. Returns
    /// `None` for a skipped record.
    pub fn ingest(&mut self, symbol: &str, price: f64, volume: f64) -> Option<&ObservationWindow> {
        if !price.is_finite() || price <= 0.0 {
            return None;
        }
        if self.min_volume_usd > 0.0 && volume < self.min_volume_usd {
            return None;
        }
        self.windows
            .entry(symbol.to_string())
            .and_modify(|w| {
                w.last_price = price;
                w.last_volume = volume;
                if price > w.high {
                    w.high = price;
                }
                if price < w.low {
                    w.low = price;
                }
            })
            .or_insert(ObservationWindow {
                high: price,
                low: price,
                last_price: price,
                last_volume: volume,
            });
        self.windows.get(symbol)
    }

    /// Collapse the window onto `anchor` so the next observation span starts
    /// at the current price rather than a stale extreme. No-op for symbols
    /// never ingested.
    pub fn reset(&mut self, symbol: &str, anchor: f64) {
        if let Some(w) = self.windows.get_mut(symbol) {
            w.high = anchor;
            w.low = anchor;
            w.last_price = anchor;
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&ObservationWindow> {
        self.windows.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
