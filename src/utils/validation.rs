use anyhow::{Result, anyhow};

/// Maximum accepted image size: 2 MiB
pub const MAX_IMAGE_SIZE: usize = 2 * 1024 * 1024;

/// Accepted MIME types for uploads
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against the upload limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        }));
    }
    Ok(())
}

/// Validates the client-supplied content type against the image allowlist.
///
/// The value is taken at face value; file contents are not sniffed. Parameters
/// such as `; charset=...` are ignored when comparing.
pub fn validate_mime_type(content_type: &str) -> Result<()> {
    let parsed: mime::Mime = content_type.trim().parse().map_err(|_| {
        anyhow!(ValidationError {
            code: "INVALID_MIME_TYPE",
            message: format!("'{}' is not a valid MIME type", content_type),
        })
    })?;

    if ALLOWED_IMAGE_TYPES
        .iter()
        .any(|&allowed| allowed == parsed.essence_str())
    {
        return Ok(());
    }

    Err(anyhow!(ValidationError {
        code: "INVALID_MIME_TYPE",
        message: format!(
            "MIME type '{}' is not allowed. Only JPG, PNG, and GIF are permitted.",
            content_type
        ),
    }))
}

/// Validates a filename taken from a URL path segment.
///
/// Generated filenames are bare names; anything that could escape the upload
/// directory is rejected before it reaches the filesystem.
pub fn validate_path_segment(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        }));
    }

    if filename.contains("..")
        || filename.contains('/')
        || filename.contains('\\')
        || filename.chars().any(|c| c.is_control())
    {
        tracing::warn!("Path traversal attempt detected: {}", filename);
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename contains illegal characters".to_string(),
        }));
    }

    if filename.starts_with('.') {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Hidden files are not served".to_string(),
        }));
    }

    Ok(())
}
