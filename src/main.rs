// Main entry point - Dependency injection and server setup
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use widget_dashboard::application::clock::{Clock, SystemClock};
use widget_dashboard::application::dashboard_repository::DashboardRepository;
use widget_dashboard::application::dashboard_service::DashboardService;
use widget_dashboard::application::dataset_repository::DatasetRepository;
use widget_dashboard::application::dataset_service::DatasetService;
use widget_dashboard::infrastructure::config::{load_app_config, load_palette_config, StorageBackend};
use widget_dashboard::infrastructure::json_file_repository::JsonFileRepository;
use widget_dashboard::infrastructure::memory_repository::MemoryRepository;
use widget_dashboard::presentation::app_state::AppState;
use widget_dashboard::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = load_app_config()?;

    // Initialize tracing, RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let palette = load_palette_config(Path::new("config")).await?;

    // Create repositories (infrastructure layer)
    let (dashboards, datasets) = match config.storage.backend {
        StorageBackend::File => {
            let repository = Arc::new(JsonFileRepository::open(config.storage.data_dir.clone()).await?);
            (
                repository.clone() as Arc<dyn DashboardRepository>,
                repository as Arc<dyn DatasetRepository>,
            )
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, nothing survives a restart");
            let repository = Arc::new(MemoryRepository::new());
            (
                repository.clone() as Arc<dyn DashboardRepository>,
                repository as Arc<dyn DatasetRepository>,
            )
        }
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Create services (application layer)
    let dashboard_service = DashboardService::new(
        dashboards,
        datasets.clone(),
        clock.clone(),
        Arc::new(palette),
        config.engine.clone(),
    );
    let dataset_service = DatasetService::new(datasets, clock);

    let state = Arc::new(AppState {
        dashboard_service,
        dataset_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("Starting widget-dashboard service on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
