use std::time::Instant;

use reqwest::Client;
use tracing::{debug, error, warn};

use super::error::ExchangeError;
use super::models::{Exchange, Period, Reading};
use crate::db::postgres::models::api_log::NewApiLog;
use crate::db::postgres::repository::api_log_repository::TraitApiLogRepository;

/// Describes one outbound history request for logging purposes.
pub(crate) struct UpstreamCall<'a> {
    pub exchange: Exchange,
    pub symbol: &'a str,
    pub period: Period,
    pub limit: usize,
    pub url: String,
}

/// Performs the GET, hands a 2xx body to `normalize`, and records exactly one
/// api_logs row for the attempt whatever the outcome.
pub(crate) async fn execute_logged<F>(
    http: &Client,
    request_log: &(dyn TraitApiLogRepository + Send + Sync),
    call: UpstreamCall<'_>,
    normalize: F,
) -> Result<Vec<Reading>, ExchangeError>
where
    F: FnOnce(&[u8]) -> Result<Vec<Reading>, ExchangeError>,
{
    let started = Instant::now();
    let (status_code, outcome) = fetch(http, &call, normalize).await;
    let response_time = started.elapsed().as_millis() as i64;

    let entry = NewApiLog {
        exchange: call.exchange,
        symbol: call.symbol.to_string(),
        period: call.period,
        limit: call.limit as i32,
        url: call.url.clone(),
        status_code,
        response_time,
        data_count: outcome.as_ref().map(|r| r.len() as i32).unwrap_or(0),
        error_msg: outcome.as_ref().err().map(|e| e.to_string()).unwrap_or_default(),
        success: outcome.is_ok(),
    };

    if let Err(e) = request_log.record(&entry).await {
        error!("Failed to record api log for {} {}: {}", call.exchange, call.symbol, e);
    }

    match &outcome {
        Ok(readings) => debug!(
            "{} {} {} returned {} readings in {}ms",
            call.exchange,
            call.symbol,
            call.period,
            readings.len(),
            response_time
        ),
        Err(e) => warn!("{} (status={}, {}ms)", e, status_code, response_time),
    }

    outcome
}

async fn fetch<F>(
    http: &Client,
    call: &UpstreamCall<'_>,
    normalize: F,
) -> (i32, Result<Vec<Reading>, ExchangeError>)
where
    F: FnOnce(&[u8]) -> Result<Vec<Reading>, ExchangeError>,
{
    let response = match http.get(&call.url).send().await {
        Ok(response) => response,
        Err(source) => {
            return (
                0,
                Err(ExchangeError::Transport {
                    exchange: call.exchange,
                    symbol: call.symbol.to_string(),
                    source,
                }),
            );
        }
    };

    let status = response.status();
    let status_code = i32::from(status.as_u16());

    if !status.is_success() {
        return (
            status_code,
            Err(ExchangeError::UpstreamStatus {
                exchange: call.exchange,
                symbol: call.symbol.to_string(),
                status: status.as_u16(),
            }),
        );
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(source) => {
            return (
                status_code,
                Err(ExchangeError::Transport {
                    exchange: call.exchange,
                    symbol: call.symbol.to_string(),
                    source,
                }),
            );
        }
    };

    (status_code, normalize(&body))
}
