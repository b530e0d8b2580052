pub mod binance;
pub mod client;
pub mod error;
pub mod http;
pub mod models;
pub mod okx;
pub mod pacer;
mod request;

#[cfg(test)]
pub(crate) mod test_server;

pub use binance::BinanceClient;
pub use client::ExchangeClient;
pub use okx::OkxClient;
