use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::client::ExchangeClient;
use super::error::ExchangeError;
use super::models::{Exchange, Period, Reading};
use super::pacer::RequestPacer;
use super::request::{UpstreamCall, execute_logged};
use crate::db::postgres::repository::api_log_repository::TraitApiLogRepository;

const RATIO_PATH: &str = "/api/v5/rubik/stat/contracts/long-short-account-ratio";

/// OKX's public rubik endpoints throttle aggressively.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

const QUOTE_SUFFIX: &str = "USDT";

#[derive(Deserialize, Debug)]
struct OkxRatioEnvelope {
    code: String,
    #[serde(default)]
    msg: String,
    /// `[[ts_ms, ratio], ...]`, newest first
    #[serde(default)]
    data: Vec<Vec<String>>,
}

/// Contract long/short account ratio, keyed by base currency.
///
/// The endpoint has no `limit` parameter: the exchange's default window is
/// fetched and truncated locally.
pub struct OkxClient {
    http: Client,
    base_url: String,
    request_log: Arc<dyn TraitApiLogRepository + Send + Sync>,
    pacer: RequestPacer,
}

impl OkxClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        request_log: Arc<dyn TraitApiLogRepository + Send + Sync>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_log,
            pacer: RequestPacer::new(MIN_REQUEST_INTERVAL),
        }
    }

    fn history_url(&self, symbol: &str, period: Period) -> String {
        format!(
            "{}{}?ccy={}&period={}",
            self.base_url,
            RATIO_PATH,
            okx_currency(symbol),
            period
        )
    }
}

#[async_trait]
impl ExchangeClient for OkxClient {
    fn exchange(&self) -> Exchange {
        Exchange::Okx
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<Reading>, ExchangeError> {
        self.pacer.wait_turn().await;

        let call = UpstreamCall {
            exchange: Exchange::Okx,
            symbol,
            period,
            limit,
            url: self.history_url(symbol, period),
        };

        execute_logged(&self.http, self.request_log.as_ref(), call, |body| {
            normalize_okx(symbol, body, limit)
        })
        .await
    }
}

/// Translates a collector symbol ("BTCUSDT") to the OKX currency ("BTC").
pub fn okx_currency(symbol: &str) -> String {
    match symbol {
        "BTCUSDT" => "BTC".to_string(),
        "ETHUSDT" => "ETH".to_string(),
        _ => match symbol.strip_suffix(QUOTE_SUFFIX) {
            Some(base) if !base.is_empty() => base.to_string(),
            _ => symbol.to_string(),
        },
    }
}

/// Maps the OKX envelope to at most `limit` readings, keeping upstream order.
pub fn normalize_okx(symbol: &str, body: &[u8], limit: usize) -> Result<Vec<Reading>, ExchangeError> {
    let envelope: OkxRatioEnvelope = serde_json::from_slice(body)
        .map_err(|e| ExchangeError::malformed(Exchange::Okx, symbol, "json", e))?;

    if envelope.code != "0" {
        return Err(ExchangeError::UpstreamApplication {
            exchange: Exchange::Okx,
            symbol: symbol.to_string(),
            code: envelope.code,
            message: envelope.msg,
        });
    }

    let readings = envelope
        .data
        .iter()
        .take(limit)
        .map(|row| {
            let [ts, ratio, ..] = row.as_slice() else {
                return Err(ExchangeError::malformed(
                    Exchange::Okx,
                    symbol,
                    "data row",
                    format!("expected [ts, ratio], got {} fields", row.len()),
                ));
            };

            let millis = ts
                .parse::<i64>()
                .map_err(|e| ExchangeError::malformed(Exchange::Okx, symbol, "timestamp", e))?;
            let ratio = ratio
                .parse::<f64>()
                .map_err(|e| ExchangeError::malformed(Exchange::Okx, symbol, "ratio", e))?;

            Reading::from_millis(Exchange::Okx, symbol, ratio, millis)
                .ok_or_else(|| ExchangeError::malformed(Exchange::Okx, symbol, "timestamp", millis))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if readings.is_empty() {
        return Err(ExchangeError::empty(Exchange::Okx, symbol));
    }

    Ok(readings)
}
