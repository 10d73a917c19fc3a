//! Route definitions for the sync endpoint.

use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Submissions are a few dozen bytes.
const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/steps",
            post(handlers::submit_steps).fallback(handlers::not_found),
        )
        .route(
            "/step-data.json",
            get(handlers::step_data).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(DEFAULT_REQUEST_TIMEOUT))
        .layer(RequestBodyLimitLayer::new(DEFAULT_BODY_LIMIT))
}
