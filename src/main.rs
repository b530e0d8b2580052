mod api;
mod app_state;
mod db;
mod env_config;
mod layers;
mod logger;
mod services;

use app_state::models::AppState;
use axum::{Router, routing::get};
use db::postgres::postgres_service::PostgresService;
use env_config::models::{app_config::AppConfig, app_env::AppEnv, app_setting::AppSettings};
use layers::{create_cors, create_trace};
use services::exchanges::{BinanceClient, ExchangeClient, OkxClient, http::build_http_client};
use services::long_short::{DataCollectionService, DataScheduler};
use std::{error::Error, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Settings and logging
    let settings: Arc<AppSettings> = Arc::new(initialize_application()?);

    // Storage
    let postgres_service = match PostgresService::new(&settings).await {
        Ok(service) => Arc::new(service),
        Err(err) => {
            error!("Cannot continue without PostgreSQL connection: {}", err);
            return Err(err);
        }
    };

    let server_address: SocketAddr = format!(
        "{}:{}",
        settings.app_env.server_address, settings.app_env.server_port,
    )
    .parse::<SocketAddr>()
    .inspect_err(|err| error!("Invalid server address configuration: {}", err))?;

    info!("Server will listen on: {}", server_address);

    // Collection and scheduling
    let (collector, scheduler) = initialize_collection_services(&settings, &postgres_service)?;

    let app_state: Arc<AppState> = Arc::new(AppState::new(
        settings.clone(),
        postgres_service,
        collector,
        scheduler.clone(),
    ));

    initialize_background_services(&app_state);

    let app_router = create_application_router(app_state.clone());

    start_http_server(app_router, server_address).await?;

    if scheduler.is_running() {
        if let Err(err) = scheduler.stop() {
            error!("Failed to stop scheduler: {}", err);
        }
    }

    info!("Application stopped");
    Ok(())
}

/// Loads environment and config, then installs the logger.
fn initialize_application() -> Result<AppSettings, Box<dyn Error>> {
    let environment = AppEnv::new()?;
    let config = AppConfig::new(&environment.env)?;
    let app_settings = AppSettings {
        app_config: config,
        app_env: environment,
    };

    logger::init_logger(
        &app_settings.app_config.log.level,
        &app_settings.app_config.log.format,
        app_settings.app_env.is_local(),
    )?;

    info!("Starting Long/Short Ratio Monitor...");
    info!("Current environment: {}", app_settings.app_env.env);

    if app_settings.app_env.is_local() {
        info!("Running in local development mode");
        debug!("Configuration details: {:#?}", app_settings);
    } else {
        info!("Running in production mode");
    }

    Ok(app_settings)
}

/// Builds the exchange clients, the collection service and the scheduler.
fn initialize_collection_services(
    settings: &Arc<AppSettings>,
    postgres_service: &Arc<PostgresService>,
) -> Result<(Arc<DataCollectionService>, Arc<DataScheduler>), Box<dyn Error>> {
    let exchanges = &settings.app_config.exchanges;
    let collector_config = &settings.app_config.collector;

    let http = build_http_client(exchanges)
        .inspect_err(|err| error!("Failed to build HTTP client: {}", err))?;

    let request_log = postgres_service.repository_api_log.clone();
    let clients: Vec<Arc<dyn ExchangeClient>> = vec![
        Arc::new(BinanceClient::new(
            http.clone(),
            exchanges.binance_base_url.as_str(),
            request_log.clone(),
        )),
        Arc::new(OkxClient::new(
            http,
            exchanges.okx_base_url.as_str(),
            request_log.clone(),
        )),
    ];

    info!(
        "Collecting {:?} from {} exchanges",
        collector_config.symbols,
        clients.len()
    );

    let collector = Arc::new(DataCollectionService::new(
        clients,
        collector_config.symbols.clone(),
    ));

    let scheduler = Arc::new(DataScheduler::new(
        collector.clone(),
        postgres_service.repository_long_short_ratio.clone(),
        request_log,
        collector_config.request_log_retention_days,
    ));

    Ok((collector, scheduler))
}

/// Starts the scheduler unless collection is disabled.
fn initialize_background_services(app_state: &Arc<AppState>) {
    if !app_state.settings.app_config.collector.enabled {
        info!("Scheduled collection is disabled in configuration");
        return;
    }

    match app_state.scheduler.start() {
        Ok(()) => info!("Background services initialized successfully"),
        Err(err) => error!("Failed to start scheduler: {}", err),
    }
}

fn create_application_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api-health", get(api::health_api))
        .route("/db-health", get(api::health_db))
        .nest("/api/v1", api::v1_routes())
        .layer(create_cors())
        .layer(axum::Extension(app_state))
        .layer(create_trace())
}

async fn start_http_server(app: Router, addr: SocketAddr) -> Result<(), Box<dyn Error>> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .inspect_err(|err| error!("Failed to bind to address {}: {}", addr, err))?;

    info!("Server started successfully, now accepting connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|err| error!("Server error: {}", err))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
