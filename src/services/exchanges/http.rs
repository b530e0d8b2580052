use std::time::Duration;

use reqwest::Client;

use crate::env_config::models::app_config::ExchangesConfig;

/// Shared client for all exchange adapters. The request timeout bounds the
/// whole call so a stalled upstream fails instead of hanging a job.
pub fn build_http_client(config: &ExchangesConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("long-short-monitor/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .build()
}
