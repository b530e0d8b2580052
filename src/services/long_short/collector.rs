use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::services::exchanges::ExchangeClient;
use crate::services::exchanges::models::{Exchange, Period, Reading, UnknownExchange};

/// One exchange's contribution to a live chart request.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeSeries {
    pub exchange: Exchange,
    pub readings: Vec<Reading>,
}

/// Fans collection out over every configured exchange client.
pub struct DataCollectionService {
    clients: Vec<Arc<dyn ExchangeClient>>,
    symbols: Vec<String>,
}

impl DataCollectionService {
    pub fn new(clients: Vec<Arc<dyn ExchangeClient>>, symbols: Vec<String>) -> Self {
        Self { clients, symbols }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Latest reading per symbol from every exchange. Exchanges run
    /// concurrently, symbols within one exchange run in sequence. Output is
    /// grouped by exchange in client order. Never fails: an exchange that
    /// yields nothing is logged and contributes nothing.
    pub async fn collect_all(&self) -> Vec<Reading> {
        let batches = join_all(
            self.clients
                .iter()
                .map(|client| async move { (client.exchange(), client.fetch_latest_batch(&self.symbols).await) }),
        )
        .await;

        let mut readings = Vec::new();
        for (exchange, batch) in batches {
            if batch.is_empty() && !self.symbols.is_empty() {
                warn!("Collection from {} produced no readings", exchange);
            } else {
                info!("Collected {}/{} readings from {}", batch.len(), self.symbols.len(), exchange);
            }
            readings.extend(batch);
        }

        readings
    }

    /// Latest readings from one exchange only.
    pub async fn collect_exchange(&self, exchange: Exchange) -> Result<Vec<Reading>, UnknownExchange> {
        let client = self
            .clients
            .iter()
            .find(|c| c.exchange() == exchange)
            .ok_or_else(|| UnknownExchange(exchange.to_string()))?;

        Ok(client.fetch_latest_batch(&self.symbols).await)
    }

    /// Live history for `symbol` from every exchange. A failing exchange
    /// yields an empty series instead of an error.
    pub async fn chart_series(&self, symbol: &str, period: Period, limit: usize) -> Vec<ExchangeSeries> {
        join_all(self.clients.iter().map(|client| async move {
            let readings = match client.fetch_history(symbol, period, limit).await {
                Ok(readings) => readings,
                Err(e) => {
                    warn!("Chart data from {} unavailable: {}", client.exchange(), e);
                    Vec::new()
                }
            };

            ExchangeSeries {
                exchange: client.exchange(),
                readings,
            }
        }))
        .await
    }
}
