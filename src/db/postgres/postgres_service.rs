use crate::db::postgres::{
    connection::PostgresConnection,
    repository::api_log_repository::{StructApiLogRepository, TraitApiLogRepository},
    repository::long_short_ratio_repository::{
        StructLongShortRatioRepository, TraitLongShortRatioRepository,
    },
    schema,
};
use crate::env_config::models::app_setting::AppSettings;
use std::sync::Arc;
use tracing::{error, info};

pub struct PostgresService {
    // Connection
    pub connection: Arc<PostgresConnection>,

    // Repositories
    pub repository_long_short_ratio: Arc<dyn TraitLongShortRatioRepository + Send + Sync>,
    pub repository_api_log: Arc<dyn TraitApiLogRepository + Send + Sync>,
}

impl PostgresService {
    pub async fn new(settings: &Arc<AppSettings>) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing PostgreSQL service components");

        info!("Creating PostgreSQL connection");
        let postgres_connection = match PostgresConnection::new(settings.clone()).await {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                error!("Failed to establish PostgreSQL connection: {}", e);
                return Err(Box::new(e));
            }
        };

        if let Err(e) = schema::ensure_schema(postgres_connection.get_pool()).await {
            error!("Failed to prepare PostgreSQL schema: {}", e);
            return Err(Box::new(e));
        }

        info!("Initializing repositories");

        let long_short_ratio_repository = Arc::new(StructLongShortRatioRepository::new(
            postgres_connection.clone(),
        ))
            as Arc<dyn TraitLongShortRatioRepository + Send + Sync>;

        let api_log_repository = Arc::new(StructApiLogRepository::new(postgres_connection.clone()))
            as Arc<dyn TraitApiLogRepository + Send + Sync>;

        info!("PostgreSQL service initialized successfully");
        Ok(Self {
            connection: postgres_connection,
            repository_long_short_ratio: long_short_ratio_repository,
            repository_api_log: api_log_repository,
        })
    }
}
