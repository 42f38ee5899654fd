pub mod admin;
pub mod chat;
pub mod contact;
pub mod feedback;
pub mod materials;

use crate::state::SharedState;
use axum::{http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

/// Opaque message returned for unexpected backend failures; the detail goes
/// to the server log only.
pub const GENERIC_ERROR: &str = "An error occurred. Please try again later.";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn fail(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            success: false,
            message: message.into(),
        }),
    )
}

/// Treat whitespace-only input the same as an absent field.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn missing_fields_error(missing: &[&str]) -> ApiError {
    fail(
        StatusCode::BAD_REQUEST,
        format!("Missing required fields: {}", missing.join(", ")),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "message": "SAP training backend is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// All `/api` routes. The caller nests this under `/api` and wires static
/// serving and layers around it.
pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(contact::router(state.clone()))
        .merge(chat::router(state.clone()))
        .merge(feedback::router(state.clone()))
        .merge(materials::router(state.clone()))
        .nest("/admin", admin::router(state))
}
