//! Query-string rules shared by the handlers. Numeric parameters never
//! reject a request: anything unusable falls back to the default.

use chrono::{DateTime, TimeDelta, Utc};

use super::response::ApiError;
use crate::services::exchanges::models::{Exchange, Period};

pub const DEFAULT_DAYS: i64 = 7;
pub const DEFAULT_HOURS: i64 = 24;
pub const DEFAULT_LOG_LIMIT: i64 = 100;
pub const MAX_LOG_LIMIT: i64 = 1000;

/// Treats an empty value as absent.
pub fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

pub fn required<'a>(value: Option<&'a String>, name: &str) -> Result<&'a str, ApiError> {
    non_empty(value).ok_or_else(|| ApiError::BadRequest(format!("{} parameter is required", name)))
}

pub fn exchange(value: Option<&String>) -> Result<Option<Exchange>, ApiError> {
    non_empty(value)
        .map(|v| v.parse::<Exchange>().map_err(|e| ApiError::BadRequest(e.to_string())))
        .transpose()
}

pub fn period(value: Option<&String>) -> Result<Period, ApiError> {
    match non_empty(value) {
        None => Ok(Period::FiveMinutes),
        Some(v) => v.parse::<Period>().map_err(|_| {
            ApiError::BadRequest(format!(
                "unsupported period, expected one of: {}",
                Period::ALL.map(|p| p.as_str()).join(", ")
            ))
        }),
    }
}

/// Positive integer or `default`.
pub fn positive_or(value: Option<&String>, default: i64) -> i64 {
    non_empty(value)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

pub fn log_limit(value: Option<&String>) -> i64 {
    match positive_or(value, DEFAULT_LOG_LIMIT) {
        limit if limit > MAX_LOG_LIMIT => DEFAULT_LOG_LIMIT,
        limit => limit,
    }
}

/// Start of a look-back window. A span too large to subtract clamps to the
/// Unix epoch.
pub fn window_start(now: DateTime<Utc>, span: Option<TimeDelta>) -> DateTime<Utc> {
    span.and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
