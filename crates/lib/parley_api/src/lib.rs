//! # parley_api
//!
//! HTTP API library for Parley.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use parley_core::generation::Generator;
use parley_core::scenario::ScenarioCatalog;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::handlers::{chat, scenarios, status, welcome};

/// Shared application state passed to all handlers.
///
/// Everything here is immutable; requests never coordinate with each other.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Scenario presets, built once at startup.
    pub catalog: Arc<ScenarioCatalog>,
    /// Upstream generation client.
    pub generator: Arc<dyn Generator>,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route(routes::GET_ROOT, get(status::status_handler))
        .route(routes::POST_CHAT, post(chat::chat_handler))
        .route(routes::POST_API_CHAT, post(chat::chat_handler))
        .route(routes::GET_SCENARIOS, get(scenarios::list_scenarios_handler))
        .route(routes::POST_WELCOME, post(welcome::welcome_handler))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::Internal(detail.to_string()).into_response()
}
