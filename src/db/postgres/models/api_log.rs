use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::services::exchanges::models::{Exchange, Period};

/// Represents a record in the api_logs table: one outbound exchange call.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PgApiLog {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub exchange: String,
    pub symbol: String,
    pub period: String,
    #[sqlx(rename = "request_limit")]
    pub limit: i32,
    pub url: String,
    /// 0 when no HTTP response was received
    pub status_code: i32,
    /// Milliseconds
    #[sqlx(rename = "response_time_ms")]
    pub response_time: i64,
    pub data_count: i32,
    pub error_msg: String,
    pub success: bool,
}

/// Insert payload for api_logs; `id` and `created_at` are assigned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApiLog {
    pub exchange: Exchange,
    pub symbol: String,
    pub period: Period,
    pub limit: i32,
    pub url: String,
    pub status_code: i32,
    pub response_time: i64,
    pub data_count: i32,
    pub error_msg: String,
    pub success: bool,
}

/// Aggregates over a window of api_logs rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiLogStatistics {
    pub total_requests: i64,
    pub success_requests: i64,
    /// Percentage in 0..=100, 0 when the window is empty
    pub success_rate: f64,
    /// Mean latency in milliseconds
    pub avg_response_time: f64,
}

impl ApiLogStatistics {
    pub fn from_counts(total_requests: i64, success_requests: i64, avg_response_time: f64) -> Self {
        let success_rate = if total_requests > 0 {
            success_requests as f64 / total_requests as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_requests,
            success_requests,
            success_rate,
            avg_response_time,
        }
    }
}
