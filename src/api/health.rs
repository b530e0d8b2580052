use axum::{extract::Extension, http::StatusCode};
use std::sync::Arc;
use tracing::error;

use crate::app_state::models::AppState;

pub async fn health_api() -> StatusCode {
    StatusCode::OK
}

pub async fn health_db(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<StatusCode, StatusCode> {
    match app_state.postgres_service.connection.ping().await {
        Ok(()) => Ok(StatusCode::OK),
        Err(e) => {
            error!("PostgreSQL health check failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
