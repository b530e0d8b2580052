use axum::extract::Extension;
use std::sync::Arc;

use super::response::ApiResponse;
use crate::app_state::models::AppState;
use crate::services::long_short::scheduler::SchedulerStatus;

/// GET /api/v1/scheduler/status
pub async fn status(Extension(app_state): Extension<Arc<AppState>>) -> ApiResponse<SchedulerStatus> {
    ApiResponse::ok(app_state.scheduler.status())
}
