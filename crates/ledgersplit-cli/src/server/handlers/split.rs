//! Upload handler: split a posted file and return the archive.

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// Split the uploaded file. The pipeline runs on a blocking thread with
/// its own state, so concurrent uploads never share clusters.
pub async fn split_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field.bytes().await.map_err(upload_error)?;
        upload = Some((name, bytes));
        break;
    }

    let (name, bytes) = upload
        .ok_or_else(|| ApiError::BadRequest(format!("no '{}' field in upload", FILE_FIELD)))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("uploaded file is empty".to_string()));
    }
    info!(file = %name, bytes = bytes.len(), "received upload");

    let splitter = state.splitter.clone();
    let upload_name = name.clone();
    let report = tokio::task::spawn_blocking(move || splitter.split_bytes(&bytes, &upload_name))
        .await
        .map_err(|e| ApiError::Internal(format!("split task failed: {}", e)))?
        .inspect_err(|e| warn!(file = %name, error = %e, "split rejected"))?;

    info!(
        file = %name,
        accountants = report.partition.len(),
        rows = report.summary.input_rows,
        "split complete"
    );

    let disposition = format!(
        "attachment; filename=\"{}_by_accountant.zip\"",
        download_stem(&name)
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.archive.bytes,
    )
        .into_response())
}

fn upload_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::TooLarge(e.body_text())
    } else {
        ApiError::BadRequest(e.body_text())
    }
}

/// ASCII-only stem of the uploaded name, safe inside a quoted header.
fn download_stem(name: &str) -> String {
    let stem = std::path::Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let safe: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.trim_matches('_').is_empty() {
        "payments".to_string()
    } else {
        safe
    }
}
