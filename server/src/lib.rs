//! Recipe Box Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Data access abstractions and implementations
//! - commands: Request handlers
//! - routes: HTTP surface over the commands

use std::sync::Arc;

use recipe_form::RecipeFieldSpecs;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

pub mod commands;
pub mod config;
pub mod domain;
pub mod repository;
pub mod routes;

use config::{Config, LimitsConfig};
use domain::UserDirectory;
use repository::{Database, RecipeStore};

/// Application state shared across commands
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecipeStore>,
    pub users: Arc<UserDirectory>,
    pub limits: LimitsConfig,
    pub fields: RecipeFieldSpecs,
    /// Route prefix, `""` or `/name`
    pub base_uri: String,
}

impl AppState {
    pub fn new(store: Arc<dyn RecipeStore>, config: &Config) -> Self {
        Self {
            store,
            users: Arc::new(UserDirectory::new(config.users.clone())),
            limits: config.limits.clone(),
            fields: RecipeFieldSpecs::default(),
            base_uri: config.server.normalized_base_uri(),
        }
    }
}

/// Run the server until Ctrl+C or SIGTERM, then close the database
pub async fn run(config: Config) -> std::io::Result<()> {
    // Initialize logging
    if let Err(e) = rolling_logger::init_logger(&config.server.log_dir, "RecipeBox") {
        eprintln!("failed to init rolling logger: {}", e);
    }

    let db = Database::open(&config.server.db_path, config.server.lock_wait())
        .map_err(std::io::Error::other)?;
    let _ = rolling_logger::info("Database opened");
    info!(path = %config.server.db_path.display(), users = config.users.len(), "database ready");

    let state = AppState::new(Arc::new(db.recipe_store()), &config);
    let app = routes::build_router(state);

    let listener = TcpListener::bind(&config.server.bind).await?;
    info!("Server running on {}", config.server.bind);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = db.close().await {
        error!("Failed to close database: {}", e);
        let _ = rolling_logger::error(&format!("Database close failed: {}", e));
    }
    info!("Server stopped");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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
}
