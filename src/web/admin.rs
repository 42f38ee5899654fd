//! Operator endpoints: collection listings, CSV export, and the login
//! check. Intentionally unauthenticated reads, matching the deployment this
//! replaces — the login route only gates the admin UI client-side.

use crate::domain::models::{ChatMessage, ChatUser, Contact, Feedback};
use crate::state::SharedState;
use crate::web::{fail, missing_fields_error, non_empty, ApiError};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct Listing<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/contacts", get(list_contacts))
        .route("/chat-users", get(list_chat_users))
        .route("/chat-messages", get(list_chat_messages))
        .route("/feedback", get(list_feedback))
        .route("/export/contacts", get(export_contacts))
        .route("/login", post(login))
        .with_state(state)
}

fn listing<T: Serialize>(data: Vec<T>) -> Json<Listing<T>> {
    Json(Listing {
        success: true,
        count: data.len(),
        data,
    })
}

async fn list_contacts(
    State(state): State<SharedState>,
) -> Result<Json<Listing<Contact>>, ApiError> {
    let contacts = state.store.list_contacts().await.map_err(|e| {
        tracing::error!("Failed to fetch contacts: {}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching contacts")
    })?;
    Ok(listing(contacts))
}

async fn list_chat_users(
    State(state): State<SharedState>,
) -> Result<Json<Listing<ChatUser>>, ApiError> {
    let users = state.store.list_chat_users().await.map_err(|e| {
        tracing::error!("Failed to fetch chat users: {}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching chat users")
    })?;
    Ok(listing(users))
}

async fn list_chat_messages(
    State(state): State<SharedState>,
) -> Result<Json<Listing<ChatMessage>>, ApiError> {
    let messages = state.store.list_chat_messages().await.map_err(|e| {
        tracing::error!("Failed to fetch chat messages: {}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching chat messages")
    })?;
    Ok(listing(messages))
}

async fn list_feedback(
    State(state): State<SharedState>,
) -> Result<Json<Listing<Feedback>>, ApiError> {
    let feedback = state.store.list_feedback().await.map_err(|e| {
        tracing::error!("Failed to fetch feedback: {}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching feedback")
    })?;
    Ok(listing(feedback))
}

/// Naive CSV: quoted text columns, no escaping of embedded quotes or
/// newlines. The format is inherited and consumers already rely on the
/// column order.
fn contacts_csv(contacts: &[Contact]) -> String {
    let mut csv = String::from("ID,Name,Email,Phone,Course,Message,Timestamp,Status\n");
    for c in contacts {
        csv.push_str(&format!(
            "{},\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",{},{}\n",
            c.id,
            c.name,
            c.email,
            c.phone,
            c.course,
            c.message,
            c.timestamp.to_rfc3339(),
            c.status,
        ));
    }
    csv
}

async fn export_contacts(
    State(state): State<SharedState>,
) -> Result<(HeaderMap, String), ApiError> {
    let contacts = state.store.list_contacts().await.map_err(|e| {
        tracing::error!("Failed to export contacts: {}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Error exporting contacts")
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=contacts.csv"),
    );
    Ok((headers, contacts_csv(&contacts)))
}

async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = non_empty(payload.username.as_deref());
    let password = non_empty(payload.password.as_deref());

    let mut missing = Vec::new();
    if username.is_none() {
        missing.push("username");
    }
    if password.is_none() {
        missing.push("password");
    }
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    // Plain comparison against configured values; no session or token is
    // issued. Inherited behavior — see DESIGN.md.
    if username.as_deref() == Some(state.admin_username.as_str())
        && password.as_deref() == Some(state.admin_password.as_str())
    {
        tracing::info!("Admin login succeeded");
        Ok(Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
        }))
    } else {
        tracing::warn!("Admin login failed");
        Err(fail(StatusCode::UNAUTHORIZED, "Invalid credentials"))
    }
}
