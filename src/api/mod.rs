mod health;
mod logs;
mod long_short;
mod params;
mod response;
mod scheduler;

pub use health::{health_api, health_db};

use axum::{
    Router,
    routing::{get, post},
};

/// Every `/api/v1` endpoint. Callers attach state and layers.
pub fn v1_routes() -> Router {
    Router::new()
        .route("/long-short/current", get(long_short::current))
        .route("/long-short/historical", get(long_short::historical))
        .route("/long-short/comparison", get(long_short::comparison))
        .route("/long-short/chart", get(long_short::chart))
        .route("/long-short/refresh", post(long_short::refresh))
        .route("/long-short/dashboard", get(long_short::dashboard))
        .route("/logs/recent", get(logs::recent))
        .route("/logs/statistics", get(logs::statistics))
        .route("/scheduler/status", get(scheduler::status))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::exchanges::models::Exchange;
    use crate::services::exchanges::test_server;
    use crate::services::long_short::collector::tests::StubClient;
    use axum::Extension;
    use serde_json::Value;
    use test_support::TestApp;

    async fn serve(app: &TestApp) -> String {
        let router = Router::new()
            .route("/api-health", get(health_api))
            .nest("/api/v1", v1_routes())
            .layer(Extension(app.state.clone()));
        test_server::spawn(router).await
    }

    #[tokio::test]
    async fn envelopes_and_status_codes() {
        let app = TestApp::new(vec![StubClient::ok(Exchange::Binance, &[("BTCUSDT", 1.4)])]);
        let base = serve(&app).await;
        let http = reqwest::Client::new();

        let health = http.get(format!("{base}/api-health")).send().await.unwrap();
        assert_eq!(health.status(), 200);

        let missing = http
            .get(format!("{base}/api/v1/long-short/current?exchange=okx&symbol=BTCUSDT"))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
        let body: Value = missing.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"success": false, "message": "no data found"}));

        let bad = http
            .get(format!("{base}/api/v1/long-short/comparison"))
            .send()
            .await
            .unwrap();
        assert_eq!(bad.status(), 400);

        let refreshed: Value = http
            .post(format!("{base}/api/v1/long-short/refresh"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(refreshed["success"], true);
        assert_eq!(refreshed["message"], "data refresh completed");
        assert_eq!(refreshed["data"], serde_json::json!({"collected": 1, "saved": 1}));

        let current: Value = http
            .get(format!("{base}/api/v1/long-short/current"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(current["data"][0]["exchange"], "binance");
        assert_eq!(current["data"][0]["ratio"], 1.4);
    }

    #[tokio::test]
    async fn storage_failure_hides_cause() {
        let app = TestApp::new(Vec::new());
        app.ratios.set_failing(true);
        let base = serve(&app).await;

        let response = reqwest::get(format!("{base}/api/v1/long-short/dashboard")).await.unwrap();

        assert_eq!(response.status(), 500);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "failed to load dashboard");
    }

    #[tokio::test]
    async fn scheduler_status_endpoint() {
        let app = TestApp::new(Vec::new());
        let base = serve(&app).await;

        let body: Value = reqwest::get(format!("{base}/api/v1/scheduler/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["data"]["running"], false);
        assert_eq!(body["data"]["tasks_count"], 0);
        assert_eq!(body["data"]["symbols"], serde_json::json!(["BTCUSDT", "ETHUSDT"]));
    }
}
