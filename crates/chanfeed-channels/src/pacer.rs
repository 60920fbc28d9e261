//! Request pacing against the gateway.
//!
//! The gateway rate-limits aggressively; instead of sprinkling fixed sleeps
//! through the fetch loop, every outbound call goes through one [`Pacer`]
//! parameterized in requests per second. A rate of `0` disables pacing.

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

/// Spaces calls at least `1/rps` apart.
pub struct Pacer {
    min_interval: Option<Duration>,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(rps: f64) -> Self {
        let min_interval = (rps > 0.0).then(|| Duration::from_secs_f64(1.0 / rps));
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until the next call slot is due.
    pub async fn pace(&self) {
        let Some(interval) = self.min_interval else {
            return;
        };
        let mut last = self.last.lock().await;
        let now = Instant::now();
        match *last {
            Some(prev) if prev + interval > now => {
                let due = prev + interval;
                sleep_until(due).await;
                *last = Some(due);
            }
            _ => {
                *last = Some(now);
            }
        }
    }
}
