//! HTTP application wiring.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServerConfig;
use crate::store::{CatalogStore, StoreError};
use crate::urls::Route;

pub mod handlers;
pub mod models;

/// Response header carrying the number of catalog queries a request issued.
pub const QUERY_COUNT_HEADER: &str = "x-query-count";

pub struct AppState {
    pub store: CatalogStore,
    pub config: ServerConfig,
}

/// Build the application router. Exposed so tests can drive the full stack
/// in process with `tower::ServiceExt::oneshot`.
pub fn router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    Router::new()
        .route(Route::Home.pattern(), get(handlers::home))
        .route(Route::VersionDetail.pattern(), get(handlers::version_detail))
        .route(
            Route::VersionDetailLatest.pattern(),
            get(handlers::version_detail_latest),
        )
        .route(Route::ModuleDetail.pattern(), get(handlers::module_detail))
        .route(
            Route::ModuleDetailLatest.pattern(),
            get(handlers::module_detail_latest),
        )
        .route(Route::KlassDetail.pattern(), get(handlers::klass_detail))
        .route(
            Route::KlassDetailLatest.pattern(),
            get(handlers::klass_detail_latest),
        )
        .route(
            Route::KlassDetailShortcut.pattern(),
            get(handlers::klass_detail_shortcut),
        )
        .route(Route::Sitemap.pattern(), get(handlers::sitemap))
        .route(Route::Healthcheck.pattern(), get(handlers::healthcheck))
        .layer(middleware::from_fn_with_state(state.clone(), count_queries))
        .layer(TimeoutLayer::new(timeout))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Stamp every response with the number of catalog queries the request
/// issued. Exact under sequential requests, which is how the snapshot suite
/// drives the app; concurrent requests may attribute each other's queries to
/// the wrong response.
async fn count_queries(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let before = state.store.query_count();
    let mut response = next.run(request).await;
    let issued = state.store.query_count().saturating_sub(before);
    if let Ok(value) = HeaderValue::try_from(issued.to_string()) {
        response.headers_mut().insert(QUERY_COUNT_HEADER, value);
    }
    response
}

/// Open the catalog configured for this server. An empty database path
/// selects a fresh in-memory catalog.
pub fn open_store(config: &ServerConfig) -> Result<CatalogStore, StoreError> {
    if config.database.is_empty() {
        CatalogStore::open_in_memory()
    } else {
        CatalogStore::open(std::path::Path::new(&config.database))
    }
}

pub async fn run() {
    dotenv().ok();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    run_with_config(config).await;
}

pub async fn run_with_config(config: ServerConfig) {
    dotenv().ok();

    log::info!(
        "Server configuration: http={}:{}, database={}, base_url={}",
        config.http_host,
        config.http_port,
        if config.database.is_empty() {
            ":memory:"
        } else {
            &config.database
        },
        config.site_base_url
    );

    let store = match open_store(&config) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open catalog database {}: {}", config.database, e);
            std::process::exit(1);
        }
    };
    if config.database.is_empty() {
        log::warn!("No catalog database configured; serving an empty in-memory catalog");
    }

    let state = Arc::new(AppState {
        store,
        config: config.clone(),
    });
    let app = router(state);

    let bind_address = format!("{}:{}", config.http_host, config.http_port);
    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => {
            log::info!("Successfully bound HTTP listener to {}", bind_address);
            listener
        }
        Err(e) => {
            log::error!("Failed to bind HTTP listener to {}: {}", bind_address, e);
            log::error!("  Is another process using port {}?", config.http_port);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("HTTP server terminated: {}", e);
    }
}
