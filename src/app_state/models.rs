use crate::db::postgres::postgres_service::PostgresService;
use crate::env_config::models::app_setting::AppSettings;
use crate::services::long_short::{DataCollectionService, DataScheduler};

use std::sync::Arc;

pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub postgres_service: Arc<PostgresService>,
    pub collector: Arc<DataCollectionService>,
    pub scheduler: Arc<DataScheduler>,
}

impl AppState {
    pub fn new(
        settings: Arc<AppSettings>,
        postgres_service: Arc<PostgresService>,
        collector: Arc<DataCollectionService>,
        scheduler: Arc<DataScheduler>,
    ) -> Self {
        Self {
            settings,
            postgres_service,
            collector,
            scheduler,
        }
    }
}
