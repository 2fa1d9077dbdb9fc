//! HTTP analysis server.
//!
//! Exposes the orchestrator over a JSON HTTP API for browser and service
//! callers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/analyze` | Analyze a meal photo |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses carry a machine-readable code and a human-readable
//! message:
//!
//! ```json
//! { "error": { "code": "rate_limited", "message": "..." } }
//! ```
//!
//! Analysis error codes map onto HTTP statuses: `rate_limited` (429),
//! `configuration_error` (500), `malformed_response` (502),
//! `transport_error` (503). Request validation failures are `bad_request`
//! (400).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support
//! browser-based clients.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use meal_lens_core::models::{AnalysisResult, Language};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::orchestrator::{AnalysisError, AnalysisOrchestrator};

/// Shared application state passed to route handlers.
#[derive(Clone)]
struct AppState {
    orchestrator: Arc<AnalysisOrchestrator>,
}

/// Starts the HTTP analysis server.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated.
pub async fn run_server(
    config: &Config,
    orchestrator: Arc<AnalysisOrchestrator>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/analyze", post(handle_analyze))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { orchestrator });

    println!("meal-lens server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"rate_limited"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let status = match &err {
            AnalysisError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AnalysisError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /analyze ============

#[derive(Deserialize)]
struct AnalyzeRequest {
    /// Base64-encoded JPEG payload.
    image: String,
    /// Display language code; defaults to English.
    #[serde(default = "default_language")]
    language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// Handler for `POST /analyze`.
///
/// Validates the request, then delegates to the orchestrator. The response
/// carries every supported language; clients pick what to display.
async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    if request.image.trim().is_empty() {
        return Err(bad_request("image must not be empty"));
    }

    let language = Language::parse(&request.language)
        .ok_or_else(|| bad_request(format!("unsupported language: {}", request.language)))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", %request_id, language = language.code());

    let result = state
        .orchestrator
        .analyze(&request.image, language)
        .instrument(span)
        .await?;

    Ok(Json(result))
}
