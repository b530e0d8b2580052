use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Enforces a minimum spacing between consecutive dispatches. Callers queue
/// on the lock, so concurrent requests are spaced too.
pub struct RequestPacer {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Blocks until `min_interval` has passed since the previous dispatch,
    /// then records now as the new dispatch time.
    pub async fn wait_turn(&self) {
        let mut last = self.last_dispatch.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                debug!("Pacing upstream request for {:?}", remaining);
                sleep(remaining).await;
            }
        }

        *last = Some(Instant::now());
    }
}
