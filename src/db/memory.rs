//! In-memory repositories used by unit tests. They follow the same key,
//! ordering and filtering rules as the SQL in `db::postgres::repository`.

use crate::db::error::StorageError;
use crate::db::postgres::models::api_log::{ApiLogStatistics, NewApiLog, PgApiLog};
use crate::db::postgres::models::long_short_ratio::PgLongShortRatio;
use crate::db::postgres::repository::api_log_repository::TraitApiLogRepository;
use crate::db::postgres::repository::long_short_ratio_repository::TraitLongShortRatioRepository;
use crate::services::exchanges::models::{Exchange, Reading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

fn unavailable() -> StorageError {
    StorageError::Database(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
pub struct MemoryLongShortRatioRepository {
    rows: Mutex<Vec<PgLongShortRatio>>,
    next_id: Mutex<i64>,
    failing: AtomicBool,
}

impl MemoryLongShortRatioRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<PgLongShortRatio> {
        self.rows.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TraitLongShortRatioRepository for MemoryLongShortRatioRepository {
    async fn upsert(&self, reading: &Reading) -> Result<(), StorageError> {
        self.check()?;
        let now = Utc::now();
        let mut rows = self.rows.lock().unwrap();

        let existing = rows.iter_mut().find(|row| {
            row.exchange == reading.exchange.as_str()
                && row.symbol == reading.symbol
                && row.observed_at == reading.observed_at
        });

        match existing {
            Some(row) => {
                row.ratio = reading.ratio;
                row.updated_at = now;
            }
            None => {
                let mut next_id = self.next_id.lock().unwrap();
                *next_id += 1;
                rows.push(PgLongShortRatio {
                    id: *next_id,
                    exchange: reading.exchange.as_str().to_string(),
                    symbol: reading.symbol.clone(),
                    ratio: reading.ratio,
                    observed_at: reading.observed_at,
                    created_at: now,
                    updated_at: now,
                });
            }
        }

        Ok(())
    }

    async fn get_latest(&self, exchange: Exchange, symbol: &str) -> Result<PgLongShortRatio, StorageError> {
        self.check()?;
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.exchange == exchange.as_str() && row.symbol == symbol)
            .max_by_key(|row| row.observed_at)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn get_range(
        &self,
        exchange: Exchange,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PgLongShortRatio>, StorageError> {
        self.check()?;
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.exchange == exchange.as_str() && row.symbol == symbol && row.observed_at >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.observed_at);
        Ok(rows)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.observed_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryApiLogRepository {
    rows: Mutex<Vec<PgApiLog>>,
    failing: AtomicBool,
}

impl MemoryApiLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<PgApiLog> {
        self.rows.lock().unwrap().clone()
    }

    /// Inserts a row with an explicit creation time.
    pub fn insert_at(&self, entry: &NewApiLog, created_at: DateTime<Utc>) {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(PgApiLog {
            id,
            created_at,
            exchange: entry.exchange.as_str().to_string(),
            symbol: entry.symbol.clone(),
            period: entry.period.as_str().to_string(),
            limit: entry.limit,
            url: entry.url.clone(),
            status_code: entry.status_code,
            response_time: entry.response_time,
            data_count: entry.data_count,
            error_msg: entry.error_msg.clone(),
            success: entry.success,
        });
    }
}

#[async_trait]
impl TraitApiLogRepository for MemoryApiLogRepository {
    async fn record(&self, entry: &NewApiLog) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.insert_at(entry, Utc::now());
        Ok(())
    }

    async fn get_recent(&self, limit: i64, exchange: Option<Exchange>) -> Result<Vec<PgApiLog>, StorageError> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| exchange.is_none_or(|e| row.exchange == e.as_str()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn get_statistics(&self, since: DateTime<Utc>) -> Result<ApiLogStatistics, StorageError> {
        let rows = self.rows.lock().unwrap();
        let window: Vec<_> = rows.iter().filter(|row| row.created_at >= since).collect();

        let total = window.len() as i64;
        let success = window.iter().filter(|row| row.success).count() as i64;
        let avg = if window.is_empty() {
            0.0
        } else {
            window.iter().map(|row| row.response_time as f64).sum::<f64>() / window.len() as f64
        };

        Ok(ApiLogStatistics::from_counts(total, success, avg))
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::exchanges::models::Period;
    use chrono::Duration;

    fn reading(exchange: Exchange, symbol: &str, ratio: f64, secs: i64) -> Reading {
        Reading {
            exchange,
            symbol: symbol.to_string(),
            ratio,
            observed_at: DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
        }
    }

    fn log_entry(exchange: Exchange, success: bool, response_time: i64) -> NewApiLog {
        NewApiLog {
            exchange,
            symbol: "BTCUSDT".to_string(),
            period: Period::FiveMinutes,
            limit: 1,
            url: "http://localhost/".to_string(),
            status_code: if success { 200 } else { 500 },
            response_time,
            data_count: if success { 1 } else { 0 },
            error_msg: if success { String::new() } else { "HTTP 500".to_string() },
            success,
        }
    }

    #[tokio::test]
    async fn test_upsert_same_key_keeps_one_row_with_last_ratio() {
        let repo = MemoryLongShortRatioRepository::new();
        repo.upsert(&reading(Exchange::Binance, "BTCUSDT", 1.1, 1_700_000_000)).await.unwrap();
        let first = repo.rows()[0].clone();

        repo.upsert(&reading(Exchange::Binance, "BTCUSDT", 2.2, 1_700_000_000)).await.unwrap();

        let rows = repo.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ratio, 2.2);
        assert_eq!(rows[0].created_at, first.created_at);
        assert_eq!(rows[0].observed_at, first.observed_at);
        assert!(rows[0].updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_upsert_distinct_keys_do_not_collide() {
        let repo = MemoryLongShortRatioRepository::new();
        repo.upsert(&reading(Exchange::Binance, "BTCUSDT", 1.0, 100)).await.unwrap();
        repo.upsert(&reading(Exchange::Okx, "BTCUSDT", 1.0, 100)).await.unwrap();
        repo.upsert(&reading(Exchange::Binance, "ETHUSDT", 1.0, 100)).await.unwrap();
        repo.upsert(&reading(Exchange::Binance, "BTCUSDT", 1.0, 101)).await.unwrap();

        assert_eq!(repo.rows().len(), 4);
    }

    #[tokio::test]
    async fn test_latest_on_empty_store_is_not_found() {
        let repo = MemoryLongShortRatioRepository::new();
        let err = repo.get_latest(Exchange::Okx, "BTCUSDT").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_latest_returns_newest_observation() {
        let repo = MemoryLongShortRatioRepository::new();
        repo.upsert(&reading(Exchange::Okx, "BTCUSDT", 1.0, 300)).await.unwrap();
        repo.upsert(&reading(Exchange::Okx, "BTCUSDT", 3.0, 900)).await.unwrap();
        repo.upsert(&reading(Exchange::Okx, "BTCUSDT", 2.0, 600)).await.unwrap();

        let latest = repo.get_latest(Exchange::Okx, "BTCUSDT").await.unwrap();
        assert_eq!(latest.ratio, 3.0);
        assert_eq!(latest.observed_at.timestamp(), 900);
    }

    #[tokio::test]
    async fn test_range_is_inclusive_and_ascending() {
        let repo = MemoryLongShortRatioRepository::new();
        for (ratio, secs) in [(5.0, 500), (1.0, 100), (3.0, 300), (4.0, 400), (2.0, 200)] {
            repo.upsert(&reading(Exchange::Binance, "ETHUSDT", ratio, secs)).await.unwrap();
        }

        let since = DateTime::<Utc>::from_timestamp(300, 0).unwrap();
        let rows = repo.get_range(Exchange::Binance, "ETHUSDT", since).await.unwrap();

        let times: Vec<i64> = rows.iter().map(|r| r.observed_at.timestamp()).collect();
        assert_eq!(times, vec![300, 400, 500]);
    }

    #[tokio::test]
    async fn test_delete_before_removes_only_older_rows() {
        let repo = MemoryLongShortRatioRepository::new();
        for secs in [100, 200, 300] {
            repo.upsert(&reading(Exchange::Binance, "BTCUSDT", 1.0, secs)).await.unwrap();
        }

        let removed = repo
            .delete_before(DateTime::<Utc>::from_timestamp(200, 0).unwrap())
            .await
            .unwrap();

        assert_eq!(removed, 1);
        let times: Vec<i64> = repo.rows().iter().map(|r| r.observed_at.timestamp()).collect();
        assert_eq!(times, vec![200, 300]);
    }

    #[tokio::test]
    async fn test_api_log_recent_is_newest_first_and_filtered() {
        let repo = MemoryApiLogRepository::new();
        let now = Utc::now();
        repo.insert_at(&log_entry(Exchange::Binance, true, 10), now - Duration::minutes(3));
        repo.insert_at(&log_entry(Exchange::Okx, true, 20), now - Duration::minutes(2));
        repo.insert_at(&log_entry(Exchange::Binance, false, 30), now - Duration::minutes(1));

        let all = repo.get_recent(2, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].response_time, 30);
        assert_eq!(all[1].response_time, 20);

        let binance = repo.get_recent(10, Some(Exchange::Binance)).await.unwrap();
        assert_eq!(binance.len(), 2);
        assert!(binance.iter().all(|row| row.exchange == "binance"));
    }

    #[tokio::test]
    async fn test_api_log_statistics_window() {
        let repo = MemoryApiLogRepository::new();
        let now = Utc::now();
        repo.insert_at(&log_entry(Exchange::Binance, true, 999), now - Duration::hours(48));
        repo.insert_at(&log_entry(Exchange::Binance, true, 100), now - Duration::hours(1));
        repo.insert_at(&log_entry(Exchange::Okx, false, 300), now - Duration::minutes(5));

        let stats = repo.get_statistics(now - Duration::hours(24)).await.unwrap();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.success_requests, 1);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(stats.avg_response_time, 200.0);

        let removed = repo.delete_before(now - Duration::hours(24)).await.unwrap();
        assert_eq!(removed, 1);
    }
}
