use crate::domain::models::Feedback;
use crate::middleware::rate_limit::{client_ip, RateLimiter};
use crate::state::SharedState;
use crate::web::{fail, missing_fields_error, ApiError, GENERIC_ERROR};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

static FEEDBACK_RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(|| RateLimiter::new(10, 60));

/// Inline base64 blows an image up by ~4/3, and the whole row goes through
/// the metadata store; keep photos small.
const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const REQUIRED_FIELDS: [&str; 7] = [
    "studentName",
    "studentEmail",
    "courseCompleted",
    "overallRating",
    "instructorRating",
    "contentRating",
    "feedbackText",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
    pub feedback_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialView {
    pub id: Uuid,
    pub name: String,
    pub role: Option<String>,
    pub course: String,
    pub rating: i32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TestimonialListing {
    pub success: bool,
    pub count: usize,
    pub data: Vec<TestimonialView>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/feedback",
            post(submit).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 1024 * 1024)),
        )
        .route("/testimonials", get(list_testimonials))
        .with_state(state)
}

fn parse_rating(name: &str, raw: Option<&String>) -> Result<i32, ApiError> {
    raw.and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| {
            fail(
                StatusCode::BAD_REQUEST,
                format!("{name} must be an integer between 1 and 5"),
            )
        })
}

async fn submit(
    headers: HeaderMap,
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let ip = client_ip(&headers);
    if !FEEDBACK_RATE_LIMITER.check(&ip).await {
        tracing::warn!("Feedback rate limit exceeded for IP: {}", ip);
        return Err(fail(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Please try again later.",
        ));
    }

    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Malformed feedback multipart payload: {}", e);
        fail(StatusCode::BAD_REQUEST, "Malformed form payload")
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field.content_type().map(str::to_string).unwrap_or_default();
            let data = field.bytes().await.map_err(|e| {
                tracing::warn!("Failed to read feedback image: {}", e);
                fail(StatusCode::BAD_REQUEST, "Could not read the uploaded image")
            })?;
            if data.is_empty() {
                // browsers submit an empty part when no photo was chosen
                continue;
            }
            if !content_type.starts_with("image/") {
                return Err(fail(
                    StatusCode::BAD_REQUEST,
                    "Only image files are accepted for the photo field",
                ));
            }
            if data.len() > MAX_IMAGE_BYTES {
                return Err(fail(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Image must be 2 MB or smaller",
                ));
            }
            image = Some((content_type, data.to_vec()));
        } else {
            let value = field.text().await.map_err(|e| {
                tracing::warn!("Failed to read feedback field '{}': {}", name, e);
                fail(StatusCode::BAD_REQUEST, "Malformed form payload")
            })?;
            fields.insert(name, value);
        }
    }

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .filter(|key| {
            fields
                .get(**key)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    // Ratings are validated here so both backends reject out-of-range input
    // the same way, not just the one whose schema happens to carry a CHECK.
    let overall_rating = parse_rating("overallRating", fields.get("overallRating"))?;
    let instructor_rating = parse_rating("instructorRating", fields.get("instructorRating"))?;
    let content_rating = parse_rating("contentRating", fields.get("contentRating"))?;

    let display_publicly = fields
        .get("displayPublicly")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "on" | "yes"))
        .unwrap_or(false);

    let image_data = image.map(|(mime, data)| {
        format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(data))
    });

    let take = |key: &str| fields.get(key).map(|v| v.trim().to_string());

    let feedback = Feedback {
        id: Uuid::new_v4(),
        student_name: take("studentName").unwrap_or_default(),
        student_email: take("studentEmail").unwrap_or_default(),
        course_completed: take("courseCompleted").unwrap_or_default(),
        student_role: take("role").filter(|v| !v.is_empty()),
        overall_rating,
        instructor_rating,
        content_rating,
        feedback_text: take("feedbackText").unwrap_or_default(),
        improvements: take("improvements").filter(|v| !v.is_empty()),
        display_publicly,
        image_data,
        status: "approved".to_string(),
        timestamp: Utc::now(),
    };

    state.store.insert_feedback(&feedback).await.map_err(|e| {
        tracing::error!("Failed to save feedback {}: {}", feedback.id, e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
    })?;

    tracing::info!(
        "New feedback {} for {} (public: {})",
        feedback.id,
        feedback.course_completed,
        feedback.display_publicly
    );

    Ok(Json(FeedbackResponse {
        success: true,
        message: "Thank you for your feedback!".to_string(),
        feedback_id: feedback.id,
    }))
}

async fn list_testimonials(
    State(state): State<SharedState>,
) -> Result<Json<TestimonialListing>, ApiError> {
    let rows = state.store.list_public_testimonials().await.map_err(|e| {
        tracing::error!("Failed to fetch testimonials: {}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching testimonials")
    })?;

    let data: Vec<TestimonialView> = rows
        .into_iter()
        .map(|f| TestimonialView {
            id: f.id,
            name: f.student_name,
            role: f.student_role,
            course: f.course_completed,
            rating: f.overall_rating,
            text: f.feedback_text,
            image: f.image_data,
            date: f.timestamp,
        })
        .collect();

    Ok(Json(TestimonialListing {
        success: true,
        count: data.len(),
        data,
    }))
}
