use axum::extract::{Extension, Query};
use chrono::{TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use super::params;
use super::response::{ApiError, ApiResponse};
use crate::app_state::models::AppState;
use crate::db::postgres::models::api_log::{ApiLogStatistics, PgApiLog};

/// GET /api/v1/logs/recent
pub async fn recent(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Vec<PgApiLog>>, ApiError> {
    let limit = params::log_limit(query.get("limit"));
    let exchange = params::exchange(query.get("exchange"))?;

    let logs = app_state
        .postgres_service
        .repository_api_log
        .get_recent(limit, exchange)
        .await
        .map_err(|e| ApiError::internal("failed to load request logs", e))?;

    Ok(ApiResponse::ok(logs))
}

/// GET /api/v1/logs/statistics
pub async fn statistics(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<ApiResponse<ApiLogStatistics>, ApiError> {
    let hours = params::positive_or(query.get("hours"), params::DEFAULT_HOURS);
    let since = params::window_start(Utc::now(), TimeDelta::try_hours(hours));

    let stats = app_state
        .postgres_service
        .repository_api_log
        .get_statistics(since)
        .await
        .map_err(|e| ApiError::internal("failed to load request statistics", e))?;

    Ok(ApiResponse::ok(stats))
}
