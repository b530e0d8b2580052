use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Represents a record in the long_short_ratios table
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PgLongShortRatio {
    pub id: i64,

    /// Exchange identifier, e.g. "binance"
    pub exchange: String,

    /// Trading pair as requested by the collector, e.g. "BTCUSDT"
    pub symbol: String,

    pub ratio: f64,

    /// Exchange-reported bucket time, whole seconds
    #[serde(rename = "timestamp")]
    pub observed_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every upsert hit
    pub updated_at: DateTime<Utc>,
}
