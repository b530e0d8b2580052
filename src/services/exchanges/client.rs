use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::ExchangeError;
use super::models::{Exchange, Period, Reading};

/// Pause between symbols inside one batch.
pub const BATCH_PAUSE: Duration = Duration::from_millis(100);

/// One upstream venue that reports long/short account ratios.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    fn exchange(&self) -> Exchange;

    /// Up to `limit` readings for `symbol`, newest first as the upstream
    /// returns them. Records exactly one api_logs row per call.
    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<Reading>, ExchangeError>;

    /// Most recent 5m reading.
    async fn fetch_latest(&self, symbol: &str) -> Result<Reading, ExchangeError> {
        self.fetch_history(symbol, Period::FiveMinutes, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::empty(self.exchange(), symbol))
    }

    /// Latest reading for each symbol, fetched one at a time. Failed symbols
    /// are logged and left out; the result may be empty.
    async fn fetch_latest_batch(&self, symbols: &[String]) -> Vec<Reading> {
        let mut readings = Vec::with_capacity(symbols.len());

        for (index, symbol) in symbols.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(BATCH_PAUSE).await;
            }

            match self.fetch_latest(symbol).await {
                Ok(reading) => {
                    debug!("{} {} ratio={}", self.exchange(), symbol, reading.ratio);
                    readings.push(reading);
                }
                Err(e) => warn!("Skipping {} for {}: {}", symbol, self.exchange(), e),
            }
        }

        readings
    }
}
