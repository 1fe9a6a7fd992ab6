//! OCR upload endpoint
//!
//! `POST /api/ocr` takes a multipart upload (field `file`, or `image` for older
//! clients), stages it in a temporary file, runs the OCR engine on it and
//! returns the reconstructed text with its confidence.

use std::io::Write;
use std::path::{Path, PathBuf};

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::ocr::{self, OcrResult};
use crate::state::AppState;

const FILE_FIELDS: [&str; 2] = ["file", "image"];
const DEFAULT_EXTENSION: &str = "jpg";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/ocr", post(process_ocr))
}

/// A validated, non-empty upload
#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    content_type: String,
    data: Bytes,
}

async fn process_ocr(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OcrResult>> {
    let request_id = Uuid::new_v4();
    let upload = read_upload(&mut multipart).await?;

    let temp_file = stage_upload(&upload, state.config().ocr.temp_dir.as_deref())?;
    tracing::info!(
        request_id = %request_id,
        path = %temp_file.path().display(),
        size = upload.data.len(),
        content_type = %upload.content_type,
        file_name = ?upload.file_name,
        "Saved temporary file"
    );

    let outcome = recognize(&state, temp_file.path()).await;

    let path = temp_file.path().to_path_buf();
    match temp_file.close() {
        Ok(()) => tracing::debug!(request_id = %request_id, "Cleaned up temp file: {}", path.display()),
        Err(e) => tracing::warn!(request_id = %request_id, "Failed to delete temp file {}: {}", path.display(), e),
    }

    outcome.map(Json)
}

async fn recognize(state: &AppState, path: &Path) -> Result<OcrResult> {
    let engine = state.engine().get().await?;

    let raw_pages = match engine.recognize(path).await {
        Ok(raw_pages) => raw_pages,
        Err(e) => {
            if e.is_fatal_to_engine() {
                state.engine().invalidate(&engine).await;
            }
            return Err(e.into());
        }
    };

    Ok(ocr::process(&raw_pages, state.config().ocr.reading_order))
}

/// Find the file field, validate its type and read it
async fn read_upload(multipart: &mut Multipart) -> Result<Upload> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        if !FILE_FIELDS.contains(&name.as_str()) {
            tracing::debug!("Ignoring multipart field '{}'", name);
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let content_type = match content_type {
            Some(ct) if is_supported_type(&ct) => ct,
            other => {
                return Err(AppError::BadRequest(format!(
                    "Unsupported file type: {}. Please upload an image or PDF.",
                    other.as_deref().unwrap_or("unknown")
                )))
            }
        };

        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Empty file uploaded".to_string()));
        }

        return Ok(Upload {
            file_name,
            content_type,
            data,
        });
    }

    tracing::warn!("No file field found in multipart upload");
    Err(AppError::BadRequest(
        "No file provided. Use field name 'file' or 'image'".to_string(),
    ))
}

fn is_supported_type(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type.starts_with("application/pdf")
}

/// Write the upload to a temp file, removed when the handle is dropped
fn stage_upload(upload: &Upload, dir: Option<&Path>) -> Result<NamedTempFile> {
    let suffix = format!(".{}", file_extension(upload));
    let mut builder = tempfile::Builder::new();
    builder.prefix("eam-ocr-").suffix(&suffix);

    let dir: PathBuf = dir.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    let mut file = builder.tempfile_in(dir)?;
    file.write_all(&upload.data)?;
    file.flush()?;
    Ok(file)
}

/// Extension from the file name, else from the content type
fn file_extension(upload: &Upload) -> String {
    let from_name = upload
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| is_safe_extension(ext));

    let from_type = || {
        mime_guess::get_mime_extensions_str(&upload.content_type)
            .and_then(|exts| exts.first().copied())
    };

    from_name
        .or_else(from_type)
        .unwrap_or(DEFAULT_EXTENSION)
        .to_ascii_lowercase()
}

fn is_safe_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
}
