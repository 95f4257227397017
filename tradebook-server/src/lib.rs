pub mod auth;
pub mod config;
mod error;
pub mod helpers;
pub mod middleware;
pub mod pages;
mod routes;
pub mod sheet;
pub mod store;
mod validation;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tradebook_sheets::SpreadsheetClient;

use crate::auth::AuthGate;
use crate::config::Config;
use crate::middleware::HttpPolicy;
use crate::pages::STATIC_ROOT;
use crate::sheet::{SheetLayout, TradingSheet};
use crate::store::{CredentialStore, SheetCredentialStore};

pub use crate::error::AppError;

/// Shared state for every handler.
pub struct AppState {
    pub sheet: Arc<TradingSheet>,
    pub gate: AuthGate,
}

impl AppState {
    /// State backed by `client`, with credentials read from the `Users` sheet.
    pub fn new(client: Arc<dyn SpreadsheetClient>, config: &Config) -> Self {
        let sheet = Arc::new(TradingSheet::new(client, SheetLayout::from(config)));
        let store = Arc::new(SheetCredentialStore::new(
            Arc::clone(&sheet),
            config.password_scheme,
        ));
        Self::with_store(sheet, store)
    }

    /// State with a custom credential store.
    pub fn with_store(sheet: Arc<TradingSheet>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            sheet,
            gate: AuthGate::new(store),
        }
    }
}

/// Create the application router backed by the given spreadsheet client
pub fn create_app(client: Arc<dyn SpreadsheetClient>, config: &Config) -> Router {
    build_router(Arc::new(AppState::new(client, config)), config)
}

/// Create the application router around existing state
pub fn build_router(state: Arc<AppState>, config: &Config) -> Router {
    let policy = Arc::new(HttpPolicy::from_config(config));

    Router::new()
        .route("/", get(routes::root))
        .route("/css", get(routes::css))
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/trade", get(routes::trade).post(routes::submit_trade))
        .route("/units", get(routes::units))
        .route("/admin", get(routes::admin))
        .route("/admin/refresh/users", post(routes::refresh_users))
        .route("/admin/refresh/units", post(routes::refresh_units))
        .route("/admin/trades/clear", post(routes::clear_trades))
        .nest_service(STATIC_ROOT, ServeDir::new(&config.static_dir))
        .fallback(routes::invalid_url)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(RequestBodyLimitLayer::new(config.request_body_limit))
        .layer(CompressionLayer::new())
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-engine"),
            HeaderValue::from_static("axum"),
        ))
        .layer(from_fn_with_state(Arc::clone(&policy), middleware::https_redirect))
        .layer(from_fn_with_state(policy, middleware::log_calls))
        .with_state(state)
}
