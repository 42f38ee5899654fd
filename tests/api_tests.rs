//! End-to-end tests: the full `/api` router against the JSON-file backend
//! in throwaway directories.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sap_training_site::state::{AppState, SharedState};
use sap_training_site::storage::{FileStore, JsonStore};
use sap_training_site::web;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    _data_dir: tempfile::TempDir,
    upload_dir: tempfile::TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let data_dir = tempfile::tempdir().unwrap();
        let upload_dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(data_dir.path()).await.unwrap();
        let files = FileStore::open(upload_dir.path()).await.unwrap();
        let state: SharedState = Arc::new(AppState {
            store: Arc::new(store),
            files,
            notifier: None,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
        });
        Self {
            app: Router::new().nest("/api", web::routes(state)),
            _data_dir: data_dir,
            upload_dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn post_json(&self, uri: &str, body: Value, ip: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn post_multipart(&self, uri: &str, body: Vec<u8>, ip: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("x-forwarded-for", ip)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    fn upload_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.upload_dir.path()).unwrap().next().is_none()
    }
}

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Build a multipart body. Parts are `(name, Some((filename, content_type)),
/// data)` for files and `(name, None, data)` for plain fields.
fn multipart_body(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_meta, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_meta {
            Some((filename, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn feedback_parts<'a>(
    name: &'a str,
    overall: &'a str,
    display_publicly: &'a str,
) -> Vec<(&'a str, Option<(&'a str, &'a str)>, &'a [u8])> {
    vec![
        ("studentName", None, name.as_bytes()),
        ("studentEmail", None, b"student@example.com".as_slice()),
        ("courseCompleted", None, b"SAP MM".as_slice()),
        ("role", None, b"Functional Consultant".as_slice()),
        ("overallRating", None, overall.as_bytes()),
        ("instructorRating", None, b"5".as_slice()),
        ("contentRating", None, b"4".as_slice()),
        ("feedbackText", None, b"Well structured, very practical.".as_slice()),
        ("displayPublicly", None, display_publicly.as_bytes()),
    ]
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new().await;
    let (status, body) = app.get_json("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn contact_submission_round_trips_to_admin_listing() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post_json(
            "/api/contact",
            json!({
                "name": "Rajesh Kumar",
                "email": "rajesh@example.com",
                "phone": "+91 98765 43210"
            }),
            "198.51.100.1",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["contactId"].is_string());

    let (status, listing) = app.get_json("/api/admin/contacts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["data"][0]["name"], "Rajesh Kumar");
    assert_eq!(listing["data"][0]["status"], "new");
    // omitted optional fields fall back to their defaults
    assert_eq!(listing["data"][0]["course"], "Not specified");
    assert_eq!(listing["data"][0]["message"], "");
}

#[tokio::test]
async fn contact_missing_fields_are_enumerated_and_nothing_is_saved() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post_json(
            "/api/contact",
            json!({"email": "rajesh@example.com"}),
            "198.51.100.2",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("name"));
    assert!(message.contains("phone"));
    assert!(!message.contains("email"));

    let (_, listing) = app.get_json("/api/admin/contacts").await;
    assert_eq!(listing["count"], 0);
}

#[tokio::test]
async fn contact_rate_limit_kicks_in_per_ip() {
    let app = TestApp::new().await;
    let payload = json!({
        "name": "Amit", "email": "amit@example.com", "phone": "+91 90000 00001"
    });
    for _ in 0..10 {
        let (status, _) = app
            .post_json("/api/contact", payload.clone(), "203.0.113.77")
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = app
        .post_json("/api/contact", payload, "203.0.113.77")
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn chat_signup_returns_the_same_user_for_a_repeated_email() {
    let app = TestApp::new().await;
    let payload = json!({
        "name": "Priya", "email": "priya@example.com", "phone": "+91 90000 00002"
    });

    let (status, first) = app
        .post_json("/api/chat/signup", payload.clone(), "198.51.100.3")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["returning"], false);
    let user_id = first["userId"].as_str().unwrap().to_string();

    let (status, second) = app
        .post_json("/api/chat/signup", payload, "198.51.100.3")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["returning"], true);
    assert_eq!(second["userId"].as_str().unwrap(), user_id);
    assert_eq!(second["message"], "Welcome back!");

    let (_, listing) = app.get_json("/api/admin/chat-users").await;
    assert_eq!(listing["count"], 1);
}

#[tokio::test]
async fn chat_message_is_saved_and_answered_with_profile_details() {
    let app = TestApp::new().await;
    let (_, signup) = app
        .post_json(
            "/api/chat/signup",
            json!({
                "name": "Sneha", "email": "sneha@example.com", "phone": "+91 90000 00003"
            }),
            "198.51.100.4",
        )
        .await;
    let user_id = signup["userId"].as_str().unwrap().to_string();

    let (status, body) = app
        .post_json(
            "/api/chat/message",
            json!({
                "userId": user_id,
                "userInfo": {"name": "Sneha", "email": "sneha@example.com", "phone": "+91 90000 00003"},
                "message": "Can I get a demo?"
            }),
            "198.51.100.4",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["messageId"].is_string());
    let reply = body["reply"].as_str().unwrap();
    assert!(reply.contains("sneha@example.com"));

    let (_, listing) = app.get_json("/api/admin/chat-messages").await;
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["data"][0]["userId"], user_id);
    assert_eq!(listing["data"][0]["userInfo"]["name"], "Sneha");
}

#[tokio::test]
async fn chat_message_without_text_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post_json("/api/chat/message", json!({"userId": "abc"}), "198.51.100.5")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message is required");

    let (_, listing) = app.get_json("/api/admin/chat-messages").await;
    assert_eq!(listing["count"], 0);
}

#[tokio::test]
async fn testimonials_show_only_public_approved_feedback() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post_multipart(
            "/api/feedback",
            multipart_body(&feedback_parts("Public Student", "5", "true")),
            "198.51.100.6",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post_multipart(
            "/api/feedback",
            multipart_body(&feedback_parts("Private Student", "4", "false")),
            "198.51.100.6",
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, listing) = app.get_json("/api/testimonials").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["data"][0]["name"], "Public Student");
    assert_eq!(listing["data"][0]["rating"], 5);
    assert_eq!(listing["data"][0]["course"], "SAP MM");

    // the admin view still sees both
    let (_, all) = app.get_json("/api/admin/feedback").await;
    assert_eq!(all["count"], 2);
}

#[tokio::test]
async fn feedback_with_out_of_range_rating_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post_multipart(
            "/api/feedback",
            multipart_body(&feedback_parts("Student", "6", "true")),
            "198.51.100.7",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("overallRating"));

    let (_, all) = app.get_json("/api/admin/feedback").await;
    assert_eq!(all["count"], 0);
}

#[tokio::test]
async fn feedback_image_is_stored_as_inline_base64() {
    let app = TestApp::new().await;
    let mut parts = feedback_parts("Photo Student", "5", "true");
    parts.push(("image", Some(("me.png", "image/png")), b"\x89PNG fake".as_slice()));

    let (status, _) = app
        .post_multipart("/api/feedback", multipart_body(&parts), "198.51.100.8")
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = app.get_json("/api/testimonials").await;
    let image = listing["data"][0]["image"].as_str().unwrap();
    assert!(image.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn feedback_photo_must_be_an_image() {
    let app = TestApp::new().await;
    let mut parts = feedback_parts("Student", "5", "true");
    parts.push(("image", Some(("resume.pdf", "application/pdf")), b"%PDF-1.4".as_slice()));

    let (status, body) = app
        .post_multipart("/api/feedback", multipart_body(&parts), "198.51.100.12")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, all) = app.get_json("/api/admin/feedback").await;
    assert_eq!(all["count"], 0);
}

#[tokio::test]
async fn non_pdf_material_upload_is_rejected_and_leaves_no_file() {
    let app = TestApp::new().await;
    let body = multipart_body(&[
        ("title", None, b"EWM Notes".as_slice()),
        ("course", None, b"SAP EWM".as_slice()),
        ("description", None, b"Week one".as_slice()),
        ("file", Some(("notes.txt", "text/plain")), b"not a pdf".as_slice()),
    ]);

    let (status, response) = app
        .post_multipart("/api/materials/upload", body, "198.51.100.9")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "Only PDF files are allowed");
    assert!(app.upload_dir_is_empty());

    let (_, listing) = app.get_json("/api/materials").await;
    assert_eq!(listing["count"], 0);
}

#[tokio::test]
async fn material_upload_with_missing_fields_cleans_up_the_file() {
    let app = TestApp::new().await;
    // file part first so it is on disk before validation can fail
    let body = multipart_body(&[
        ("file", Some(("notes.pdf", "application/pdf")), b"%PDF-1.4 body".as_slice()),
        ("course", None, b"SAP MM".as_slice()),
    ]);

    let (status, response) = app
        .post_multipart("/api/materials/upload", body, "198.51.100.10")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = response["message"].as_str().unwrap();
    assert!(message.contains("title"));
    assert!(message.contains("description"));
    assert!(app.upload_dir_is_empty());
}

#[tokio::test]
async fn material_lifecycle_upload_download_delete() {
    let app = TestApp::new().await;
    let pdf_bytes: &[u8] = b"%PDF-1.4 course material";
    let body = multipart_body(&[
        ("title", None, b"MM Overview".as_slice()),
        ("course", None, b"SAP MM".as_slice()),
        ("description", None, b"Module overview deck".as_slice()),
        ("file", Some(("overview.pdf", "application/pdf")), pdf_bytes),
    ]);

    let (status, response) = app
        .post_multipart("/api/materials/upload", body, "198.51.100.11")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    let id = response["material"]["id"].as_str().unwrap().to_string();
    assert_eq!(response["material"]["originalName"], "overview.pdf");
    assert_eq!(response["material"]["fileSize"], pdf_bytes.len() as i64);

    let (_, listing) = app.get_json("/api/materials").await;
    assert_eq!(listing["count"], 1);

    // download: bytes plus attachment headers
    let request = Request::builder()
        .uri(format!("/api/materials/download/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("overview.pdf"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], pdf_bytes);

    // view uses inline disposition
    let request = Request::builder()
        .uri(format!("/api/materials/view/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("inline"));

    // delete removes the file and the metadata row
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/materials/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, response) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert!(app.upload_dir_is_empty());

    let (status, _) = app.get_json(&format!("/api/materials/download/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listing) = app.get_json("/api/materials").await;
    assert_eq!(listing["count"], 0);
}

#[tokio::test]
async fn unknown_material_ids_are_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .get_json(&format!("/api/materials/download/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // a malformed id is indistinguishable from an absent one
    let (status, _) = app.get_json("/api/materials/view/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn csv_export_has_header_and_one_row_per_contact() {
    let app = TestApp::new().await;
    for (i, name) in ["Amit", "Priya"].iter().enumerate() {
        let (status, _) = app
            .post_json(
                "/api/contact",
                json!({
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase()),
                    "phone": "+91 90000 00000",
                    "course": "SAP FICO",
                    "message": "please call"
                }),
                &format!("198.51.100.{}", 20 + i),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let request = Request::builder()
        .uri("/api/admin/export/contacts")
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();

    assert_eq!(csv.lines().count(), 3);
    assert_eq!(
        csv.lines().next().unwrap(),
        "ID,Name,Email,Phone,Course,Message,Timestamp,Status"
    );
    assert!(csv.contains("\"Amit\""));
    assert!(csv.contains("\"Priya\""));
}

#[tokio::test]
async fn admin_login_compares_configured_credentials() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/admin/login",
            json!({"username": "admin", "password": "admin123"}),
            "198.51.100.30",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app
        .post_json(
            "/api/admin/login",
            json!({"username": "admin", "password": "wrong"}),
            "198.51.100.30",
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}
