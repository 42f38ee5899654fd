use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A contact-form inquiry. `status` starts at "new"; nothing transitions it
/// after that — the admin listing is the only consumer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub course: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

/// A chat-widget registration. Email is the dedup key: signing up twice with
/// the same address returns the original record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

/// One chat-widget message. `user_id` is the signed-up user's id as a string,
/// or the literal "anonymous". `user_info` is a denormalized snapshot of
/// whatever profile the client sent along — kept per message, not joined.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: String,
    pub user_info: serde_json::Value,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A course-feedback submission. Rows double as testimonials: they surface on
/// the public listing iff `display_publicly` is set and `status` is
/// "approved". `image_data` is an inline `data:<mime>;base64,...` URL.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub course_completed: String,
    pub student_role: Option<String>,
    pub overall_rating: i32,
    pub instructor_rating: i32,
    pub content_rating: i32,
    pub feedback_text: String,
    pub improvements: Option<String>,
    pub display_publicly: bool,
    pub image_data: Option<String>,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    pub fn is_public(&self) -> bool {
        self.display_publicly && self.status == "approved"
    }
}

/// Metadata for an uploaded course PDF. The bytes live on disk under
/// `file_path`; deleting a material removes the file first, then this row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    pub title: String,
    pub course: String,
    pub description: String,
    pub filename: String,
    pub original_name: String,
    pub file_size: i64,
    pub file_path: String,
    pub upload_date: DateTime<Utc>,
}
