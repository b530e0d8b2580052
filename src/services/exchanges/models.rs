use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Upstream venue a reading was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Okx,
}

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::Binance, Exchange::Okx];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Okx => "okx",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownExchange(pub String);

impl fmt::Display for UnknownExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported exchange: {}", self.0)
    }
}

impl std::error::Error for UnknownExchange {}

impl FromStr for Exchange {
    type Err = UnknownExchange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "okx" => Ok(Exchange::Okx),
            _ => Err(UnknownExchange(s.to_string())),
        }
    }
}

/// Aggregation bucket the exchanges compute account ratios over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::FiveMinutes,
        Period::FifteenMinutes,
        Period::ThirtyMinutes,
        Period::OneHour,
        Period::TwoHours,
        Period::FourHours,
        Period::OneDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::FiveMinutes => "5m",
            Period::FifteenMinutes => "15m",
            Period::ThirtyMinutes => "30m",
            Period::OneHour => "1h",
            Period::TwoHours => "2h",
            Period::FourHours => "4h",
            Period::OneDay => "1d",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unsupported period: {}", s))
    }
}

/// One long/short account ratio observation, normalised across exchanges.
///
/// `(exchange, symbol, observed_at)` is the natural key; `observed_at` is
/// always whole seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub exchange: Exchange,
    pub symbol: String,
    pub ratio: f64,
    #[serde(rename = "timestamp")]
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    /// Builds a reading from an exchange millisecond timestamp, dropping
    /// sub-second precision. Returns `None` for out-of-range timestamps.
    pub fn from_millis(exchange: Exchange, symbol: &str, ratio: f64, millis: i64) -> Option<Self> {
        let observed_at = DateTime::<Utc>::from_timestamp(millis.div_euclid(1000), 0)?;
        Some(Self {
            exchange,
            symbol: symbol.to_string(),
            ratio,
            observed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_round_trips_through_str() {
        for exchange in Exchange::ALL {
            assert_eq!(exchange.as_str().parse::<Exchange>(), Ok(exchange));
        }
        assert_eq!("OKX".parse::<Exchange>(), Ok(Exchange::Okx));
        assert!("bybit".parse::<Exchange>().is_err());
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("5m".parse::<Period>(), Ok(Period::FiveMinutes));
        assert_eq!("1d".parse::<Period>(), Ok(Period::OneDay));
        assert!("3m".parse::<Period>().is_err());
        assert!("1H".parse::<Period>().is_err());
    }

    #[test]
    fn test_reading_truncates_to_whole_seconds() {
        let reading = Reading::from_millis(Exchange::Binance, "BTCUSDT", 1.5, 1_700_000_000_999).unwrap();
        assert_eq!(reading.observed_at.timestamp(), 1_700_000_000);
        assert_eq!(reading.observed_at.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_reading_serializes_timestamp_field() {
        let reading = Reading::from_millis(Exchange::Okx, "ETHUSDT", 0.9, 1_700_000_000_000).unwrap();
        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["exchange"], "okx");
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
    }
}
