//! # Vacation Tracker Backend
//!
//! Backend for a single-user vacation day tracker: employees enter a date
//! range, the tracker counts the business days in it (weekends and
//! configured holidays excluded) and records a request against the annual
//! allotment once the remaining balance covers it.
//!
//! ## Layers
//!
//! - **Domain**: business-day counting, balances, the reducer holding all
//!   screen state, and the controller task that owns it
//! - **Storage**: per-user collections behind async traits, with live
//!   snapshot subscriptions; CSV/YAML files or SQLite
//! - **IO**: the REST surface used by the presentation client
//!
//! ```text
//! REST handlers ──intent──▶ controller ──effects──▶ storage
//!       ▲                       │  ▲                   │
//!       └────── ViewModel ──────┘  └──── snapshots ────┘
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::domain::{ControllerHandle, IdentityService, TrackerController};
use crate::storage::csv::CsvConnection;
use crate::storage::sqlite::DbConnection;
use crate::storage::StoreHandles;

/// Shared state handed to every REST handler
#[derive(Clone)]
pub struct AppState {
    pub controller: ControllerHandle,
    /// Direct store access for routes that act as an external system
    pub store: StoreHandles,
}

/// Open the configured storage, sign in and start the controller
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;

    info!("Setting up {} storage", config.storage);
    let store = match config.storage {
        StorageBackend::Csv => {
            let connection = CsvConnection::new(&config.data_dir)?;
            StoreHandles::from_connection(&connection)
        }
        StorageBackend::Sqlite => {
            let connection = DbConnection::new(&config.database_url).await?;
            StoreHandles::from_connection(&connection)
        }
    };

    info!("Starting tracker controller");
    let identity = IdentityService::new(&config.data_dir, config.auth_token.clone());
    let controller = TrackerController::spawn(store.clone(), identity);

    Ok(AppState { controller, store })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .nest("/api", io::rest::router())
        .layer(cors)
        .with_state(app_state)
}
