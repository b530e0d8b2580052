use thiserror::Error;

use super::models::Exchange;

/// Why a single upstream call produced no readings. Every variant names the
/// exchange and the symbol that was requested.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("{exchange} request for {symbol} failed: {source}")]
    Transport {
        exchange: Exchange,
        symbol: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{exchange} returned HTTP {status} for {symbol}")]
    UpstreamStatus {
        exchange: Exchange,
        symbol: String,
        status: u16,
    },

    #[error("{exchange} rejected request for {symbol}: code={code} msg={message}")]
    UpstreamApplication {
        exchange: Exchange,
        symbol: String,
        code: String,
        message: String,
    },

    #[error("{exchange} response for {symbol} is malformed at {target}: {detail}")]
    MalformedResponse {
        exchange: Exchange,
        symbol: String,
        target: &'static str,
        detail: String,
    },

    #[error("{exchange} returned no readings for {symbol}")]
    EmptyResult { exchange: Exchange, symbol: String },
}

impl ExchangeError {
    pub(crate) fn malformed(exchange: Exchange, symbol: &str, target: &'static str, detail: impl ToString) -> Self {
        ExchangeError::MalformedResponse {
            exchange,
            symbol: symbol.to_string(),
            target,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn empty(exchange: Exchange, symbol: &str) -> Self {
        ExchangeError::EmptyResult {
            exchange,
            symbol: symbol.to_string(),
        }
    }
}
