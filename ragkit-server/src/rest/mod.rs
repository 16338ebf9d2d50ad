//! REST routes.

pub mod controllers;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::{AppState, ServerConfig};
use controllers::{documents, health, query};

/// Build the router with all routes, body limits and request tracing.
pub fn create_app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/query", post(query::query))
        .route("/documents", post(documents::add_document))
        .route("/upload", post(documents::upload))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
