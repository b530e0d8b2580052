use axum::extract::{Extension, Query};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::params;
use super::response::{ApiError, ApiResponse};
use crate::app_state::models::AppState;
use crate::db::error::StorageError;
use crate::db::postgres::models::long_short_ratio::PgLongShortRatio;
use crate::services::exchanges::models::{Exchange, Period, Reading};
use crate::services::long_short::scheduler::CollectionSummary;

/// Points per exchange on the live chart.
pub const CHART_POINTS: usize = 30;

const NOT_FOUND: &str = "no data found";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioView {
    pub exchange: String,
    pub symbol: String,
    pub ratio: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<PgLongShortRatio> for RatioView {
    fn from(row: PgLongShortRatio) -> Self {
        Self {
            exchange: row.exchange,
            symbol: row.symbol,
            ratio: row.ratio,
            timestamp: row.observed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioPoint {
    pub ratio: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&PgLongShortRatio> for RatioPoint {
    fn from(row: &PgLongShortRatio) -> Self {
        Self {
            ratio: row.ratio,
            timestamp: row.observed_at,
        }
    }
}

impl From<&Reading> for RatioPoint {
    fn from(reading: &Reading) -> Self {
        Self {
            ratio: reading.ratio,
            timestamp: reading.observed_at,
        }
    }
}

/// A single pair when both filters are given, otherwise the matrix.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CurrentRatios {
    Single(RatioView),
    Matrix(Vec<RatioView>),
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub symbol: String,
    /// Keyed by exchange identifier
    pub data: BTreeMap<&'static str, Vec<RatioPoint>>,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub symbol: String,
    pub period: Period,
    #[serde(flatten)]
    pub series: BTreeMap<&'static str, Vec<RatioPoint>>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSymbol {
    pub symbol: String,
    pub data: Vec<DashboardEntry>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DashboardEntry {
    pub exchange: Exchange,
    pub ratio: f64,
    /// Latest ratio minus the oldest one in the last 24 hours
    pub change: f64,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/v1/long-short/current
pub async fn current(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<ApiResponse<CurrentRatios>, ApiError> {
    let exchange = params::exchange(query.get("exchange"))?;
    let symbol = params::non_empty(query.get("symbol"));
    let repo = &app_state.postgres_service.repository_long_short_ratio;

    if let (Some(exchange), Some(symbol)) = (exchange, symbol) {
        let row = repo.get_latest(exchange, symbol).await.map_err(|e| {
            if e.is_not_found() {
                ApiError::NotFound(NOT_FOUND)
            } else {
                ApiError::internal("failed to load current ratio", e)
            }
        })?;
        return Ok(ApiResponse::ok(CurrentRatios::Single(row.into())));
    }

    let exchanges: Vec<Exchange> = match exchange {
        Some(exchange) => vec![exchange],
        None => Exchange::ALL.to_vec(),
    };
    let symbols: Vec<&str> = match symbol {
        Some(symbol) => vec![symbol],
        None => app_state.collector.symbols().iter().map(String::as_str).collect(),
    };

    let mut views = Vec::new();
    for exchange in exchanges {
        for symbol in &symbols {
            match repo.get_latest(exchange, symbol).await {
                Ok(row) => views.push(row.into()),
                Err(StorageError::NotFound) => continue,
                Err(e) => return Err(ApiError::internal("failed to load current ratios", e)),
            }
        }
    }

    Ok(ApiResponse::ok(CurrentRatios::Matrix(views)))
}

/// GET /api/v1/long-short/historical
pub async fn historical(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<ApiResponse<Vec<RatioPoint>>, ApiError> {
    let (Some(exchange), Some(symbol)) = (
        params::exchange(query.get("exchange"))?,
        params::non_empty(query.get("symbol")),
    ) else {
        return Err(ApiError::BadRequest(
            "exchange and symbol parameters are required".to_string(),
        ));
    };

    let days = params::positive_or(query.get("days"), params::DEFAULT_DAYS);
    let since = params::window_start(Utc::now(), TimeDelta::try_days(days));

    let rows = app_state
        .postgres_service
        .repository_long_short_ratio
        .get_range(exchange, symbol, since)
        .await
        .map_err(|e| ApiError::internal("failed to load historical data", e))?;

    Ok(ApiResponse::ok(rows.iter().map(RatioPoint::from).collect()))
}

/// GET /api/v1/long-short/comparison
pub async fn comparison(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<ApiResponse<ComparisonResponse>, ApiError> {
    let symbol = params::required(query.get("symbol"), "symbol")?;
    let days = params::positive_or(query.get("days"), params::DEFAULT_DAYS);
    let since = params::window_start(Utc::now(), TimeDelta::try_days(days));

    let mut data = BTreeMap::new();
    for exchange in Exchange::ALL {
        let rows = app_state
            .postgres_service
            .repository_long_short_ratio
            .get_range(exchange, symbol, since)
            .await
            .map_err(|e| ApiError::internal("failed to load comparison data", e))?;
        data.insert(exchange.as_str(), rows.iter().map(RatioPoint::from).collect());
    }

    Ok(ApiResponse::ok(ComparisonResponse {
        symbol: symbol.to_string(),
        data,
    }))
}

/// GET /api/v1/long-short/chart
///
/// Served live from the exchanges, not from storage.
pub async fn chart(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<ApiResponse<ChartResponse>, ApiError> {
    let symbol = params::required(query.get("symbol"), "symbol")?;
    let period = params::period(query.get("period"))?;

    let series: BTreeMap<_, Vec<RatioPoint>> = app_state
        .collector
        .chart_series(symbol, period, CHART_POINTS)
        .await
        .into_iter()
        .map(|s| (s.exchange.as_str(), s.readings.iter().map(RatioPoint::from).collect()))
        .collect();

    Ok(ApiResponse::ok(ChartResponse {
        symbol: symbol.to_string(),
        period,
        series,
    }))
}

/// POST /api/v1/long-short/refresh
pub async fn refresh(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<ApiResponse<CollectionSummary>, ApiError> {
    let summary = match params::exchange(query.get("exchange"))? {
        Some(exchange) => app_state
            .scheduler
            .collect_exchange_now(exchange)
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => app_state.scheduler.collect_now().await,
    };

    Ok(ApiResponse::ok_with_message("data refresh completed", summary))
}

/// GET /api/v1/long-short/dashboard
pub async fn dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<ApiResponse<Vec<DashboardSymbol>>, ApiError> {
    let repo = &app_state.postgres_service.repository_long_short_ratio;
    let since = params::window_start(Utc::now(), TimeDelta::try_hours(24));

    let mut dashboard = Vec::new();
    for symbol in app_state.collector.symbols() {
        let mut data = Vec::new();

        for exchange in Exchange::ALL {
            let latest = match repo.get_latest(exchange, symbol).await {
                Ok(row) => row,
                Err(StorageError::NotFound) => continue,
                Err(e) => return Err(ApiError::internal("failed to load dashboard", e)),
            };

            let window = repo
                .get_range(exchange, symbol, since)
                .await
                .map_err(|e| ApiError::internal("failed to load dashboard", e))?;

            data.push(DashboardEntry {
                exchange,
                ratio: latest.ratio,
                change: window.first().map_or(0.0, |oldest| latest.ratio - oldest.ratio),
                timestamp: latest.observed_at,
            });
        }

        dashboard.push(DashboardSymbol {
            symbol: symbol.clone(),
            data,
        });
    }

    Ok(ApiResponse::ok(dashboard))
}
