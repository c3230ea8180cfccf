//! Bounded startup retry.
//!
//! Only the initial snapshot uses this: a cold start against a flapping API
//! deserves a few tries before the process gives up. Steady-state fetch
//! failures are handled by the poll loop, which waits a full interval
//! instead.

use std::future::Future;

use anyhow::{anyhow, Result};
use rand::Rng;
use tokio::time::{sleep, Duration};

use crate::logging::{log, obj, v_num, v_str, Level};

#[derive(Clone, Debug)]
pub struct Backoff {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            attempts: 4,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl Backoff {
    /// Exponential delay capped at `max_delay_ms`, plus up to 25% jitter so
    /// synchronized restarts do not stampede the API.
    fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(16) as u64);
        let capped = exp.min(self.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0..=capped / 4);
        Duration::from_millis(capped + jitter)
    }
}

pub async fn with_backoff<F, Fut, T>(policy: &Backoff, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;
    for attempt in 0..policy.attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let delay = policy.delay(attempt);
                log(
                    Level::Warn,
                    "retry",
                    obj(&[
                        ("what", v_str(what)),
                        ("attempt", v_num((attempt + 1) as f64)),
                        ("of", v_num(policy.attempts as f64)),
                        ("error", v_str(&format!("{err:#}"))),
                        ("delay_ms", v_num(delay.as_millis() as f64)),
                    ]),
                );
                last_error = Some(err);
                if attempt + 1 < policy.attempts {
                    sleep(delay).await;
                }
            }
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow!("{}: no attempts configured", what)))
}
