use crate::domain::chatbot::{self, Profile};
use crate::domain::models::{ChatMessage, ChatUser};
use crate::state::SharedState;
use crate::web::{fail, missing_fields_error, non_empty, ApiError, GENERIC_ERROR};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SignupPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub user_id: Uuid,
    pub returning: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub user_id: Option<String>,
    pub user_info: Option<serde_json::Value>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    pub message_id: Uuid,
    pub reply: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/chat/signup", post(signup))
        .route("/chat/message", post(message))
        .with_state(state)
}

async fn signup(
    State(state): State<SharedState>,
    Json(payload): Json<SignupPayload>,
) -> Result<Json<SignupResponse>, ApiError> {
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
    let email = email.unwrap_or_default();

    // Email is the dedup key: a resubmission hands back the original id.
    let existing = state
        .store
        .find_chat_user_by_email(&email)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up chat user by email: {}", e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
        })?;

    if let Some(user) = existing {
        tracing::info!("Returning chat user {} ({})", user.id, user.email);
        return Ok(Json(SignupResponse {
            success: true,
            message: "Welcome back!".to_string(),
            user_id: user.id,
            returning: true,
        }));
    }

    let user = ChatUser {
        id: Uuid::new_v4(),
        name: name.unwrap_or_default(),
        email,
        phone: phone.unwrap_or_default(),
        timestamp: Utc::now(),
        status: "active".to_string(),
    };

    state.store.insert_chat_user(&user).await.map_err(|e| {
        tracing::error!("Failed to save chat user {}: {}", user.id, e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
    })?;

    tracing::info!("New chat user registered: {}", user.id);

    Ok(Json(SignupResponse {
        success: true,
        message: "Registration successful!".to_string(),
        user_id: user.id,
        returning: false,
    }))
}

async fn message(
    State(state): State<SharedState>,
    Json(payload): Json<MessagePayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Some(text) = non_empty(payload.message.as_deref()) else {
        return Err(fail(StatusCode::BAD_REQUEST, "Message is required"));
    };

    // Reply interpolation prefers the stored profile over the request's
    // snapshot; a lookup failure only degrades the reply, never the save.
    let stored_user = match payload
        .user_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok())
    {
        Some(id) => state.store.find_chat_user(id).await.unwrap_or_else(|e| {
            tracing::warn!("Chat user lookup failed for {}: {}", id, e);
            None
        }),
        None => None,
    };
    let profile = match (&stored_user, &payload.user_info) {
        (Some(user), _) => Profile::from_user(user),
        (None, Some(info)) => Profile::from_snapshot(info),
        (None, None) => Profile::anonymous(),
    };

    let chat_message = ChatMessage {
        id: Uuid::new_v4(),
        user_id: non_empty(payload.user_id.as_deref()).unwrap_or_else(|| "anonymous".to_string()),
        user_info: payload.user_info.unwrap_or_else(|| serde_json::json!({})),
        message: text,
        timestamp: Utc::now(),
    };

    state
        .store
        .insert_chat_message(&chat_message)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save chat message {}: {}", chat_message.id, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
        })?;

    let reply = chatbot::reply(&chat_message.message, &profile);

    Ok(Json(MessageResponse {
        success: true,
        message: "Message saved".to_string(),
        message_id: chat_message.id,
        reply,
    }))
}
