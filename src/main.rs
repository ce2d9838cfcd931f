//! FRC Scouting Backend
//!
//! Offline-first local store for match scouting, with batched sync to a shared sheet
//! and read-only lookups against the competition-data API.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod lookup;
mod models;
mod stats;
mod sync;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::LocalStore;
use lookup::TbaClient;
use sync::{SheetsClient, SyncCoordinator, SyncSettings};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LocalStore>,
    pub sync: Arc<SyncCoordinator>,
    pub tba: Arc<TbaClient>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the store, the sheet client and the lookup client together.
    pub fn new(store: Arc<LocalStore>, config: Config) -> Result<Self, errors::AppError> {
        let sheets = SheetsClient::new(config.sync_endpoint.clone())?;
        let sync = Arc::new(SyncCoordinator::new(
            store.clone(),
            sheets,
            SyncSettings::from(&config),
        ));
        let tba = Arc::new(TbaClient::new(&config.tba_base_url, &config.tba_auth_key)?);

        Ok(Self {
            store,
            sync,
            tba,
            config: Arc::new(config),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FRC Scouting Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Starting {}",
        if config.start_online { "online" } else { "offline" }
    );

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let store = Arc::new(LocalStore::new(pool));

    let bind_addr = config.bind_addr;
    let state = AppState::new(store, config)?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Admin-only routes, gated on the stored session
    let admin_routes = Router::new()
        // Roster
        .route(
            "/scouters",
            get(api::list_scouters)
                .post(api::create_scouter)
                .put(api::replace_scouters),
        )
        .route(
            "/scouters/{id}",
            put(api::update_scouter).delete(api::delete_scouter),
        )
        // Schedule and events
        .route("/matches", put(api::replace_matches))
        .route("/event", put(api::set_selected_event))
        .route("/events/search", get(api::search_events))
        .route("/events/{key}/import", post(api::import_event_matches))
        .route("/events/{key}/rankings", get(api::event_rankings))
        .route("/events/{key}/teams/{team}", get(api::team_event_status))
        // Analysis
        .route("/stats", get(api::team_stats))
        // Store maintenance
        .route("/store/import", post(api::import_legacy_record))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    // API routes
    let api_routes = Router::new()
        // Datastore
        .route("/datastore", get(api::get_datastore))
        .route("/datastore/revision", get(api::get_revision))
        .route("/store/issues", get(api::list_store_issues))
        // Session
        .route("/session", get(api::get_session))
        .route("/session/login", post(api::login))
        .route("/session/logout", post(api::logout))
        .route("/session/assignment/{username}", get(api::get_assignment))
        // Schedule
        .route("/matches", get(api::list_matches))
        .route("/matches/mine", get(api::my_matches))
        .route("/event", get(api::get_selected_event))
        // Entries
        .route("/entries", get(api::list_entries).post(api::submit_entry))
        .route("/entries/unsynced", get(api::list_unsynced))
        .route("/entries/{id}", patch(api::update_entry))
        // Sync
        .route("/sync", post(api::trigger_sync))
        .route("/sync/status", get(api::sync_status))
        .route("/sync/test", get(api::test_sync_connection))
        .route("/connectivity", put(api::set_connectivity))
        .nest("/admin", admin_routes);

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod tests;
