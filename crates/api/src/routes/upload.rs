use axum::Json;
use axum::extract::{Multipart, State};
use patitas_infra::media::{MAX_BATCH_FILES, MediaError, MediaUpload};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Upload relay failures come back as a client error wrapping the
/// upstream message.
fn map_media_error(err: MediaError) -> ApiError {
    ApiError::Validation(format!("upload failed: {err}"))
}

struct IncomingFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn collect_files(mut multipart: Multipart, max: usize) -> Result<Vec<IncomingFile>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("invalid multipart payload: {err}")))?
    {
        let Some(name) = field.name() else {
            continue;
        };
        if name != "file" && name != "files" {
            continue;
        }
        if files.len() >= max {
            return Err(ApiError::Validation(format!(
                "too many files, max is {max}"
            )));
        }
        let file_name = field.file_name().unwrap_or("upload.jpg").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::Validation(format!("failed to read file: {err}")))?;
        files.push(IncomingFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

#[derive(Serialize)]
pub(crate) struct SingleUploadResponse {
    success: bool,
    url: String,
    public_id: String,
}

pub(crate) async fn upload_single(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SingleUploadResponse>, ApiError> {
    let mut files = collect_files(multipart, 1).await?;
    let Some(file) = files.pop() else {
        return Err(ApiError::Validation("no file provided".into()));
    };

    let MediaUpload {
        secure_url,
        public_id,
    } = state
        .media
        .upload_image(&file.file_name, &file.content_type, file.bytes)
        .await
        .map_err(map_media_error)?;

    Ok(Json(SingleUploadResponse {
        success: true,
        url: secure_url,
        public_id,
    }))
}

#[derive(Serialize)]
pub(crate) struct MultiUploadResponse {
    success: bool,
    urls: Vec<String>,
    count: usize,
}

pub(crate) async fn upload_multiple(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MultiUploadResponse>, ApiError> {
    let files = collect_files(multipart, MAX_BATCH_FILES).await?;
    if files.is_empty() {
        return Err(ApiError::Validation("no files provided".into()));
    }

    // One forward per file, awaited in order.
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        let upload = state
            .media
            .upload_image(&file.file_name, &file.content_type, file.bytes)
            .await
            .map_err(map_media_error)?;
        urls.push(upload.secure_url);
    }

    let count = urls.len();
    Ok(Json(MultiUploadResponse {
        success: true,
        urls,
        count,
    }))
}
