//! # Itemflow Server
//!
//! Runs the item REST API and bulk processing engine as a standalone server.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default configuration (in-memory storage)
//! cargo run --bin itemflow-server
//!
//! # Run against PostgreSQL in production
//! ITEMFLOW_ENV=production \
//! ITEMFLOW__STORAGE__BACKEND=postgres \
//! ITEMFLOW__STORAGE__DATABASE_URL=postgresql://localhost/itemflow \
//!     cargo run --bin itemflow-server
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use itemflow_core::config::{ConfigLoader, ItemflowConfig, StorageBackend};
use itemflow_core::execution::{ItemProcessor, WorkerPool};
use itemflow_core::logging;
use itemflow_core::services::ItemService;
use itemflow_core::storage::{InMemoryItemRepository, ItemRepository};
use itemflow_core::web::{create_app, AppState};

#[derive(Debug, Parser)]
#[command(name = "itemflow-server")]
#[command(about = "Item management API with bulk status processing")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Base configuration file (overrides ITEMFLOW_CONFIG_PATH)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment name used to pick the overlay file
    #[arg(short, long, env = "ITEMFLOW_ENV")]
    environment: Option<String>,

    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = load_config(&cli)?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    let environment = config
        .environment
        .clone()
        .unwrap_or_else(ConfigLoader::detect_environment);

    logging::init_structured_logging(&config.logging, &environment);

    info!("🚀 Starting Itemflow Server...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));
    info!("   Environment: {}", environment);
    info!("   Storage: {:?}", config.storage.backend);
    info!(
        "   Worker slots: {}",
        config.worker_pool.max_concurrent_items
    );

    let repository = build_repository(&config).await?;
    let pool = WorkerPool::from_config(&config.worker_pool);
    let processor = ItemProcessor::from_config(repository.clone(), &config.processing);
    let service = ItemService::with_pool(repository, pool.clone(), processor);

    let bind_address = config.server.bind_address.clone();
    let state = Arc::new(AppState::new(service, config));
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    info!("🎉 Itemflow Server listening on {}", bind_address);
    info!("   Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("🛑 Shutdown signal received, closing worker pool...");
    pool.close();
    info!("👋 Itemflow Server shutdown complete");

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ItemflowConfig> {
    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(ConfigLoader::detect_environment);

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path, &environment)?,
        None => ConfigLoader::load_for_environment(&environment)?,
    };
    Ok(config)
}

async fn build_repository(config: &ItemflowConfig) -> anyhow::Result<Arc<dyn ItemRepository>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("🔧 Using in-memory item store");
            Ok(Arc::new(InMemoryItemRepository::new()))
        }
        #[cfg(feature = "postgres")]
        StorageBackend::Postgres => {
            info!("🔧 Connecting to PostgreSQL item store...");
            let repository = itemflow_core::storage::PgItemRepository::connect(&config.storage)
                .await
                .context("failed to connect to PostgreSQL")?;
            repository
                .run_migrations()
                .await
                .context("failed to apply item table migration")?;
            Ok(Arc::new(repository))
        }
        #[cfg(not(feature = "postgres"))]
        StorageBackend::Postgres => Err(anyhow::anyhow!(
            "storage.backend = \"postgres\" requires the `postgres` feature"
        )),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
