//! HTTP API for the intake service.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::logging_middleware;
pub use types::*;

use axum::extract::DefaultBodyLimit;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use submission_store::{Ledger, Storage};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Upload storage backend
    pub storage: Arc<Storage>,
    /// Submissions ledger
    pub ledger: Arc<Ledger>,
    /// Directory receipt PDFs are written to
    pub submissions_dir: PathBuf,
    /// Base URL used to absolutize file links in receipts
    pub public_base_url: String,
    /// Per-file upload size cap
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        storage: Storage,
        ledger: Ledger,
        submissions_dir: PathBuf,
        public_base_url: impl Into<String>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            storage: Arc::new(storage),
            ledger: Arc::new(ledger),
            submissions_dir,
            public_base_url: public_base_url.into(),
            max_upload_bytes,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    // Body cap: two maximum uploads plus form-field overhead.
    let body_limit = state.max_upload_bytes * 2 + 64 * 1024;

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/submit", post(handlers::submit))
        .route("/list-submissions", get(handlers::list_submissions))
        // Receipts are downloadable directly.
        .nest_service("/submissions", ServeDir::new(&state.submissions_dir));

    // Uploads are only served when they live on local disk.
    if let Some(uploads_dir) = state.storage.local_dir() {
        router = router.nest_service("/uploads", ServeDir::new(uploads_dir));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
