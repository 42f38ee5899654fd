use crate::domain::models::Material;
use crate::state::SharedState;
use crate::web::{fail, missing_fields_error, non_empty, ApiError, GENERIC_ERROR};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;
/// Body limit leaves headroom for the multipart framing and text fields.
const UPLOAD_BODY_LIMIT: usize = MAX_PDF_BYTES + 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub material: Material,
}

#[derive(Debug, Serialize)]
pub struct MaterialListing {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Material>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(
            "/materials/upload",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/materials", get(list))
        .route("/materials/download/:id", get(download))
        .route("/materials/view/:id", get(view))
        .route("/materials/:id", delete(remove))
        .with_state(state)
}

struct SavedUpload {
    filename: String,
    original_name: String,
    size: i64,
    path: String,
}

/// Remove a half-written upload. A rejected request must never leave an
/// orphaned file behind.
async fn discard(state: &SharedState, saved: &Option<SavedUpload>) {
    if let Some(upload) = saved {
        if let Err(e) = state.files.remove(&upload.filename).await {
            tracing::error!("Failed to clean up rejected upload {}: {}", upload.filename, e);
        }
    }
}

async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let id = Uuid::new_v4();
    let mut title = None;
    let mut course = None;
    let mut description = None;
    let mut saved: Option<SavedUpload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed material upload payload: {}", e);
                discard(&state, &saved).await;
                return Err(fail(StatusCode::BAD_REQUEST, "Malformed upload payload"));
            }
        };

        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let content_type = field.content_type().map(str::to_string).unwrap_or_default();
                if content_type != "application/pdf" {
                    discard(&state, &saved).await;
                    return Err(fail(StatusCode::BAD_REQUEST, "Only PDF files are allowed"));
                }
                let original_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| "document.pdf".to_string());
                let data = match field.bytes().await {
                    Ok(data) => data,
                    Err(e) => {
                        tracing::warn!("Failed to read material upload: {}", e);
                        discard(&state, &saved).await;
                        return Err(fail(
                            StatusCode::PAYLOAD_TOO_LARGE,
                            "File exceeds the 10 MB limit",
                        ));
                    }
                };
                if data.len() > MAX_PDF_BYTES {
                    discard(&state, &saved).await;
                    return Err(fail(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "File exceeds the 10 MB limit",
                    ));
                }

                let filename = format!("{id}.pdf");
                let path = state.files.save(&filename, &data).await.map_err(|e| {
                    tracing::error!("Failed to write upload {}: {}", filename, e);
                    fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
                })?;
                saved = Some(SavedUpload {
                    filename,
                    original_name,
                    size: data.len() as i64,
                    path: path.to_string_lossy().to_string(),
                });
            }
            "title" => title = field.text().await.ok(),
            "course" => course = field.text().await.ok(),
            "description" => description = field.text().await.ok(),
            other => {
                tracing::debug!("Ignoring unexpected upload field '{}'", other);
            }
        }
    }

    let title = non_empty(title.as_deref());
    let course = non_empty(course.as_deref());
    let description = non_empty(description.as_deref());

    let mut missing = Vec::new();
    if title.is_none() {
        missing.push("title");
    }
    if course.is_none() {
        missing.push("course");
    }
    if description.is_none() {
        missing.push("description");
    }
    if !missing.is_empty() {
        // the PDF may already be on disk by the time the text fields turn
        // out to be incomplete
        discard(&state, &saved).await;
        return Err(missing_fields_error(&missing));
    }

    let Some(upload) = saved else {
        return Err(fail(StatusCode::BAD_REQUEST, "A PDF file is required"));
    };

    let material = Material {
        id,
        title: title.unwrap_or_default(),
        course: course.unwrap_or_default(),
        description: description.unwrap_or_default(),
        filename: upload.filename.clone(),
        original_name: upload.original_name,
        file_size: upload.size,
        file_path: upload.path,
        upload_date: Utc::now(),
    };

    if let Err(e) = state.store.insert_material(&material).await {
        tracing::error!("Failed to save material {}: {}", material.id, e);
        if let Err(e) = state.files.remove(&material.filename).await {
            tracing::error!("Failed to clean up upload {}: {}", material.filename, e);
        }
        return Err(fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR));
    }

    tracing::info!("Material {} uploaded ({} bytes)", material.id, material.file_size);

    Ok(Json(UploadResponse {
        success: true,
        message: "Material uploaded successfully".to_string(),
        material,
    }))
}

async fn list(State(state): State<SharedState>) -> Result<Json<MaterialListing>, ApiError> {
    let data = state.store.list_materials().await.map_err(|e| {
        tracing::error!("Failed to fetch materials: {}", e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching materials")
    })?;
    Ok(Json(MaterialListing {
        success: true,
        count: data.len(),
        data,
    }))
}

async fn fetch_material(state: &SharedState, raw_id: &str) -> Result<Material, ApiError> {
    let id = Uuid::parse_str(raw_id)
        .map_err(|_| fail(StatusCode::NOT_FOUND, "Material not found"))?;
    state
        .store
        .find_material(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch material {}: {}", id, e);
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching material")
        })?
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Material not found"))
}

/// Stream the stored PDF back. Existence is checked before any bytes go out
/// so a metadata-only orphan surfaces as a clean not-found.
async fn serve_file(
    state: &SharedState,
    raw_id: &str,
    disposition: &str,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    let material = fetch_material(state, raw_id).await?;

    if !state.files.exists(&material.filename).await {
        tracing::warn!(
            "Material {} has no file on disk ({})",
            material.id,
            material.filename
        );
        return Err(fail(StatusCode::NOT_FOUND, "File not found on server"));
    }

    let bytes = state.files.read(&material.filename).await.map_err(|e| {
        tracing::error!("Failed to read file for material {}: {}", material.id, e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
    })?;

    let safe_name: String = material
        .original_name
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .filter(|c| *c != '"')
        .collect();

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("{disposition}; filename=\"{safe_name}\""))
            .map_err(|_| fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR))?,
    );
    Ok((headers, bytes))
}

async fn download(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    serve_file(&state, &id, "attachment").await
}

async fn view(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    serve_file(&state, &id, "inline").await
}

async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let material = fetch_material(&state, &id).await?;

    // File first, then the row: a crash in between leaves a metadata-only
    // orphan that download/view reports as not-found, never a row pointing
    // nowhere while claiming to exist.
    match state.files.remove(&material.filename).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(
                "File for material {} was already missing ({})",
                material.id,
                material.filename
            );
        }
        Err(e) => {
            tracing::error!("Failed to delete file for material {}: {}", material.id, e);
            return Err(fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR));
        }
    }

    let removed = state.store.remove_material(material.id).await.map_err(|e| {
        tracing::error!("Failed to delete material {}: {}", material.id, e);
        fail(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
    })?;
    if !removed {
        return Err(fail(StatusCode::NOT_FOUND, "Material not found"));
    }

    tracing::info!("Material {} deleted", material.id);

    Ok(Json(DeleteResponse {
        success: true,
        message: "Material deleted successfully".to_string(),
    }))
}
