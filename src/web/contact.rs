use crate::domain::models::Contact;
use crate::middleware::rate_limit::{client_ip, RateLimiter};
use crate::state::SharedState;
use crate::web::{fail, missing_fields_error, non_empty, ApiError, GENERIC_ERROR};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static CONTACT_RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(|| RateLimiter::new(10, 60));

#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub course: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    pub contact_id: Uuid,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/contact", post(submit))
        .with_state(state)
}

async fn submit(
    headers: HeaderMap,
    State(state): State<SharedState>,
    Json(payload): Json<ContactPayload>,
) -> Result<Json<ContactResponse>, ApiError> {
    let ip = client_ip(&headers);
    if !CONTACT_RATE_LIMITER.check(&ip).await {
        tracing::warn!("Contact form rate limit exceeded for IP: {}", ip);
        return Err(fail(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Please try again later.",
        ));
    }

    let name = non_empty(payload.name.as_deref());
    let email = non_empty(payload.email.as_deref());
    let phone = non_empty(payload.phone.as_deref());

    let mut missing = Vec::new();
    if name.is_none() {
        missing.push("name");
    }
    if email.is_none() {
        missing.push("email");
    }
    if phone.is_none() {
        missing.push("phone");
    }
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    let contact = Contact {
        id: Uuid::new_v4(),
        name: name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        course: non_empty(payload.course.as_deref()).unwrap_or_else(|| "Not specified".to_string()),
        message: payload.message.unwrap_or_default(),
        timestamp: Utc::now(),
        status: "new".to_string(),
    };

    state.store.insert_contact(&contact).await.map_err(|e| {
        tracing::error!("Failed to save contact {}: {}", contact.id, e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
    })?;

    tracing::info!("New contact inquiry {} from {}", contact.id, contact.email);

    // Best effort: a dead relay must never fail the submission.
    if let Some(notifier) = &state.notifier {
        let notifier = notifier.clone();
        let contact_copy = contact.clone();
        tokio::spawn(async move {
            notifier.send_contact_alert(&contact_copy).await;
        });
    }

    Ok(Json(ContactResponse {
        success: true,
        message: "Thank you! We have received your inquiry and will contact you soon.".to_string(),
        contact_id: contact.id,
    }))
}
