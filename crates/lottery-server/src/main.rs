//! Travel lottery intake service - entry point.

use lottery_server::{
    api::{create_router, AppState},
    config::Config,
};
use submission_store::Ledger;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting travel lottery intake service");

    // Initialize upload storage
    let storage = match config.storage.build() {
        Ok(s) => s,
        Err(e) => {
            error!("Invalid storage configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Ensure local directories exist before serving from them
    if let Err(e) = tokio::fs::create_dir_all(&config.submissions.dir).await {
        error!(
            "Failed to create submissions directory {:?}: {}",
            config.submissions.dir, e
        );
        std::process::exit(1);
    }
    if let Some(uploads_dir) = storage.local_dir() {
        if let Err(e) = tokio::fs::create_dir_all(uploads_dir).await {
            error!("Failed to create uploads directory {:?}: {}", uploads_dir, e);
            std::process::exit(1);
        }
    }

    let ledger = Ledger::new(config.submissions.ledger_path.clone());

    // Create application state and router
    let state = AppState::new(
        storage,
        ledger,
        config.submissions.dir.clone(),
        config.server.public_base_url.clone(),
        config.limits.max_upload_bytes,
    );
    let app = create_router(state);

    // Bind to address
    let addr = match config.server.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid server configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
