use crate::db::error::StorageError;
use crate::db::postgres::connection::PostgresConnection;
use crate::db::postgres::models::api_log::{ApiLogStatistics, NewApiLog, PgApiLog};
use crate::services::exchanges::models::Exchange;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait TraitApiLogRepository {
    /// Appends one audit row.
    async fn record(&self, entry: &NewApiLog) -> Result<(), StorageError>;

    /// Newest-first, optionally restricted to one exchange.
    async fn get_recent(&self, limit: i64, exchange: Option<Exchange>) -> Result<Vec<PgApiLog>, StorageError>;

    async fn get_statistics(&self, since: DateTime<Utc>) -> Result<ApiLogStatistics, StorageError>;

    /// Deletes rows created before the cutoff, returns the number removed.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError>;
}

pub struct StructApiLogRepository {
    connection: Arc<PostgresConnection>,
}

impl StructApiLogRepository {
    pub fn new(connection: Arc<PostgresConnection>) -> Self {
        Self { connection }
    }
}

const SELECT_COLUMNS: &str = "id, created_at, exchange, symbol, period, request_limit, url, \
     status_code, response_time_ms, data_count, error_msg, success";

#[async_trait]
impl TraitApiLogRepository for StructApiLogRepository {
    async fn record(&self, entry: &NewApiLog) -> Result<(), StorageError> {
        let pool = self.connection.get_pool();

        sqlx::query(
            "INSERT INTO api_logs
             (created_at, exchange, symbol, period, request_limit, url,
              status_code, response_time_ms, data_count, error_msg, success)
             VALUES (NOW(), $1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(entry.exchange.as_str())
        .bind(&entry.symbol)
        .bind(entry.period.as_str())
        .bind(entry.limit)
        .bind(&entry.url)
        .bind(entry.status_code)
        .bind(entry.response_time)
        .bind(entry.data_count)
        .bind(&entry.error_msg)
        .bind(entry.success)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn get_recent(&self, limit: i64, exchange: Option<Exchange>) -> Result<Vec<PgApiLog>, StorageError> {
        let pool = self.connection.get_pool();

        let rows = match exchange {
            Some(exchange) => {
                let query = format!(
                    "SELECT {} FROM api_logs WHERE exchange = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
                    SELECT_COLUMNS
                );
                sqlx::query_as::<_, PgApiLog>(&query)
                    .bind(exchange.as_str())
                    .bind(limit)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {} FROM api_logs ORDER BY created_at DESC, id DESC LIMIT $1",
                    SELECT_COLUMNS
                );
                sqlx::query_as::<_, PgApiLog>(&query)
                    .bind(limit)
                    .fetch_all(pool)
                    .await?
            }
        };

        debug!("Fetched {} api log rows", rows.len());

        Ok(rows)
    }

    async fn get_statistics(&self, since: DateTime<Utc>) -> Result<ApiLogStatistics, StorageError> {
        let pool = self.connection.get_pool();

        let row = sqlx::query(
            "SELECT
                COUNT(*) AS total_requests,
                COUNT(*) FILTER (WHERE success) AS success_requests,
                COALESCE(AVG(response_time_ms), 0)::DOUBLE PRECISION AS avg_response_time
             FROM api_logs
             WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(pool)
        .await?;

        let total: i64 = row.try_get("total_requests")?;
        let success: i64 = row.try_get("success_requests")?;
        let avg: f64 = row.try_get("avg_response_time")?;

        Ok(ApiLogStatistics::from_counts(total, success, avg))
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let pool = self.connection.get_pool();

        let result = sqlx::query("DELETE FROM api_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
