use crate::AppState;
use crate::api::error::AppError;
use crate::utils::validation::{self, MAX_IMAGE_SIZE};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Multipart, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
    pub filename: String,
}

#[utoipa::path(
    post,
    path = "/api/upload",
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "No file, multiple files, or failed validation"),
        (status = 500, description = "Storage or database failure")
    ),
    tag = "images"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_err)? {
        // Non-file fields and unrelated file fields are drained and ignored.
        if field.name() != Some("image") || field.file_name().is_none() {
            continue;
        }

        if upload.is_some() {
            return Err(AppError::BadRequest(
                "Only one file is accepted per upload".to_string(),
            ));
        }

        let original_name = field.file_name().unwrap_or("unnamed").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(map_multipart_err)?;

        upload = Some((original_name, content_type, data));
    }

    let (original_name, content_type, data) = upload.ok_or(AppError::BadRequest(
        "No file uploaded or invalid type".to_string(),
    ))?;

    // Both checks run before any byte reaches the upload directory.
    validation::validate_mime_type(&content_type)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    validation::validate_file_size(data.len(), MAX_IMAGE_SIZE)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let record = state
        .image_service
        .store(&original_name, &content_type, &data)
        .await?;

    let url = format!(
        "{}/uploads/{}",
        request_base_url(&state, &headers),
        record.filename
    );

    Ok(Json(UploadResponse {
        message: "Upload successful".to_string(),
        url,
        filename: record.filename,
    }))
}

#[utoipa::path(
    get,
    path = "/api/download/{filename}",
    params(
        ("filename" = String, Path, description = "Generated filename")
    ),
    responses(
        (status = 200, description = "File stream as attachment"),
        (status = 400, description = "Malformed filename"),
        (status = 404, description = "File not found")
    ),
    tag = "images"
)]
pub async fn download_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    validation::validate_path_segment(&filename)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let file = match state.storage.open(&filename).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("File not found".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let metadata = file.metadata().await?;

    // ASCII fallback plus RFC 5987 percent-encoded UTF-8 filename
    let ascii_filename: String = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64)
        .collect();
    let fallback_filename = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };
    let encoded_filename = utf8_percent_encode(&filename, NON_ALPHANUMERIC).to_string();

    let content_disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    );

    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = (
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (header::CONTENT_DISPOSITION, content_disposition),
        ],
        body,
    )
        .into_response();

    response.headers_mut().insert(
        header::CONTENT_LENGTH,
        metadata
            .len()
            .to_string()
            .parse()
            .unwrap_or(header::HeaderValue::from_static("0")),
    );

    Ok(response)
}

fn map_multipart_err(e: axum::extract::multipart::MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}

/// Base used for retrieval URLs: the configured public base when set,
/// otherwise the scheme and host the request arrived on.
fn request_base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.public_base_url {
        return base.clone();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}", scheme, host)
}

/// Content type by extension; the metadata row is not consulted.
fn content_type_for(filename: &str) -> &'static str {
    let extension = filename.split('.').next_back().unwrap_or("").to_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("1716000000000-42.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
