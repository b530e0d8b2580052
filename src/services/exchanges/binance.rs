use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::client::ExchangeClient;
use super::error::ExchangeError;
use super::models::{Exchange, Period, Reading};
use super::request::{UpstreamCall, execute_logged};
use crate::db::postgres::repository::api_log_repository::TraitApiLogRepository;

const RATIO_PATH: &str = "/futures/data/globalLongShortAccountRatio";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BinanceRatioEntry {
    long_short_ratio: String,
    /// Milliseconds since epoch
    timestamp: i64,
}

#[derive(Deserialize, Debug)]
struct BinanceApiError {
    code: i64,
    msg: String,
}

/// USDⓈ-M futures global long/short account ratio.
pub struct BinanceClient {
    http: Client,
    base_url: String,
    request_log: Arc<dyn TraitApiLogRepository + Send + Sync>,
}

impl BinanceClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        request_log: Arc<dyn TraitApiLogRepository + Send + Sync>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_log,
        }
    }

    fn history_url(&self, symbol: &str, period: Period, limit: usize) -> String {
        format!(
            "{}{}?symbol={}&period={}&limit={}",
            self.base_url, RATIO_PATH, symbol, period, limit
        )
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        period: Period,
        limit: usize,
    ) -> Result<Vec<Reading>, ExchangeError> {
        let call = UpstreamCall {
            exchange: Exchange::Binance,
            symbol,
            period,
            limit,
            url: self.history_url(symbol, period, limit),
        };

        execute_logged(&self.http, self.request_log.as_ref(), call, |body| {
            normalize_binance(symbol, body)
        })
        .await
    }
}

/// Maps a Binance ratio array to readings, keeping upstream order.
pub fn normalize_binance(symbol: &str, body: &[u8]) -> Result<Vec<Reading>, ExchangeError> {
    let entries: Vec<BinanceRatioEntry> = match serde_json::from_slice(body) {
        Ok(entries) => entries,
        Err(parse_error) => {
            // Binance reports errors as {"code": .., "msg": ..}, sometimes with a 200.
            return Err(match serde_json::from_slice::<BinanceApiError>(body) {
                Ok(api_error) => ExchangeError::UpstreamApplication {
                    exchange: Exchange::Binance,
                    symbol: symbol.to_string(),
                    code: api_error.code.to_string(),
                    message: api_error.msg,
                },
                Err(_) => ExchangeError::malformed(Exchange::Binance, symbol, "json", parse_error),
            });
        }
    };

    if entries.is_empty() {
        return Err(ExchangeError::empty(Exchange::Binance, symbol));
    }

    entries
        .into_iter()
        .map(|entry| {
            let ratio = entry
                .long_short_ratio
                .parse::<f64>()
                .map_err(|e| ExchangeError::malformed(Exchange::Binance, symbol, "longShortRatio", e))?;

            Reading::from_millis(Exchange::Binance, symbol, ratio, entry.timestamp).ok_or_else(|| {
                ExchangeError::malformed(Exchange::Binance, symbol, "timestamp", entry.timestamp)
            })
        })
        .collect()
}
