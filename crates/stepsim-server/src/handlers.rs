//! Request handlers for the sync endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::payload::parse_submission;
use crate::state::AppState;

/// Failures reported to clients as `{ok: false, error: <code>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    InvalidJson,
    WriteFailed,
    ReadFailed,
    NotFound,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidJson => "invalid_json",
            ApiError::WriteFailed => "failed_to_write_file",
            ApiError::ReadFailed => "failed_to_read_file",
            ApiError::NotFound => "not_found",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson => StatusCode::BAD_REQUEST,
            ApiError::WriteFailed | ApiError::ReadFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = AckResponse {
            ok: false,
            error: Some(self.code()),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct AckResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub store: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        store: state.store().describe(),
    })
}

/// `POST /api/steps`: overwrite the shared file with the submitted state.
pub async fn submit_steps(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AckResponse>, ApiError> {
    let submitted = parse_submission(&body).map_err(|e| {
        warn!("Invalid JSON payload: {}", e);
        ApiError::InvalidJson
    })?;

    state.store().save(&submitted).await.map_err(|e| {
        error!("{}", e);
        ApiError::WriteFailed
    })?;
    debug!("Stored {} steps ({})", submitted.steps, submitted.status);

    Ok(Json(AckResponse {
        ok: true,
        error: None,
    }))
}

/// `GET /step-data.json`: the shared file as stored.
pub async fn step_data(State(state): State<AppState>) -> Result<Response, ApiError> {
    let content = state.store().raw().await.map_err(|e| {
        error!("{}", e);
        ApiError::ReadFailed
    })?;
    Ok(([(header::CONTENT_TYPE, "application/json")], content).into_response())
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
