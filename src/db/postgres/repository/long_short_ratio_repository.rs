use crate::db::error::StorageError;
use crate::db::postgres::connection::PostgresConnection;
use crate::db::postgres::models::long_short_ratio::PgLongShortRatio;
use crate::services::exchanges::models::{Exchange, Reading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error};

#[async_trait]
pub trait TraitLongShortRatioRepository {
    /// Inserts the reading, or replaces the ratio of the row sharing its
    /// (exchange, symbol, observed_at) key. `created_at` is kept on update.
    async fn upsert(&self, reading: &Reading) -> Result<(), StorageError>;

    /// Most recent reading by observed_at; `StorageError::NotFound` when none.
    async fn get_latest(&self, exchange: Exchange, symbol: &str) -> Result<PgLongShortRatio, StorageError>;

    /// Readings with observed_at >= since, oldest first.
    async fn get_range(
        &self,
        exchange: Exchange,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PgLongShortRatio>, StorageError>;

    /// Deletes readings with observed_at < cutoff, returns the number removed.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError>;
}

pub struct StructLongShortRatioRepository {
    connection: Arc<PostgresConnection>,
}

impl StructLongShortRatioRepository {
    pub fn new(connection: Arc<PostgresConnection>) -> Self {
        Self { connection }
    }
}

const SELECT_COLUMNS: &str = "id, exchange, symbol, ratio, observed_at, created_at, updated_at";

#[async_trait]
impl TraitLongShortRatioRepository for StructLongShortRatioRepository {
    async fn upsert(&self, reading: &Reading) -> Result<(), StorageError> {
        let pool = self.connection.get_pool();

        debug!(
            "Upserting ratio {} for {}/{} at {}",
            reading.ratio, reading.exchange, reading.symbol, reading.observed_at
        );

        let result = sqlx::query(
            "INSERT INTO long_short_ratios (exchange, symbol, ratio, observed_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, NOW(), NOW())
             ON CONFLICT (exchange, symbol, observed_at)
             DO UPDATE SET ratio = EXCLUDED.ratio, updated_at = NOW()",
        )
        .bind(reading.exchange.as_str())
        .bind(&reading.symbol)
        .bind(reading.ratio)
        .bind(reading.observed_at)
        .execute(pool)
        .await;

        match result {
            Ok(pg_result) => {
                debug!(
                    "Upserted {}/{}, rows affected: {}",
                    reading.exchange,
                    reading.symbol,
                    pg_result.rows_affected()
                );
                Ok(())
            }
            Err(e) => {
                error!("Error upserting {}/{}: {}", reading.exchange, reading.symbol, e);
                Err(e.into())
            }
        }
    }

    async fn get_latest(&self, exchange: Exchange, symbol: &str) -> Result<PgLongShortRatio, StorageError> {
        let pool = self.connection.get_pool();

        let query = format!(
            "SELECT {} FROM long_short_ratios
             WHERE exchange = $1 AND symbol = $2
             ORDER BY observed_at DESC
             LIMIT 1",
            SELECT_COLUMNS
        );

        let row = sqlx::query_as::<_, PgLongShortRatio>(&query)
            .bind(exchange.as_str())
            .bind(symbol)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) => Ok(row),
            None => {
                debug!("No readings stored for {}/{}", exchange, symbol);
                Err(StorageError::NotFound)
            }
        }
    }

    async fn get_range(
        &self,
        exchange: Exchange,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PgLongShortRatio>, StorageError> {
        let pool = self.connection.get_pool();

        let query = format!(
            "SELECT {} FROM long_short_ratios
             WHERE exchange = $1 AND symbol = $2 AND observed_at >= $3
             ORDER BY observed_at ASC",
            SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<_, PgLongShortRatio>(&query)
            .bind(exchange.as_str())
            .bind(symbol)
            .bind(since)
            .fetch_all(pool)
            .await?;

        debug!("Fetched {} readings for {}/{} since {}", rows.len(), exchange, symbol, since);

        Ok(rows)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let pool = self.connection.get_pool();

        let result = sqlx::query("DELETE FROM long_short_ratios WHERE observed_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
