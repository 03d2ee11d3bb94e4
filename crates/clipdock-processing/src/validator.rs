//! Content-type checks for uploaded files.
//!
//! A declared type is the multipart part's `Content-Type` header. A sniffed
//! type comes from the file's leading bytes, which are buffered before any
//! staging file exists.

/// Number of leading bytes read before deciding whether to stage a file.
pub const SNIFF_LEN: usize = 512;

pub const VIDEO_MP4: &str = "video/mp4";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_JPEG: &str = "image/jpeg";

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing content type")]
    MissingContentType,

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("File content does not match declared type {declared} (detected: {detected})")]
    ContentMismatch { declared: String, detected: String },

    #[error("Empty file")]
    EmptyFile,
}

/// Lower-case a MIME type and strip any parameters (`; codecs=...`).
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Check a declared content type against an allow-list. Returns the
/// normalized type on success.
pub fn validate_declared_type(
    content_type: Option<&str>,
    allowed: &[&str],
) -> Result<String, ValidationError> {
    let raw = content_type.ok_or(ValidationError::MissingContentType)?;
    let normalized = normalize_mime_type(raw);
    if !allowed.contains(&normalized.as_str()) {
        return Err(ValidationError::InvalidContentType {
            content_type: raw.to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok(normalized)
}

/// Identify a file type from its leading bytes.
pub fn sniff(prefix: &[u8]) -> Option<&'static str> {
    infer::get(prefix).map(|kind| kind.mime_type())
}

/// Require the leading bytes to be recognised as `declared`.
pub fn validate_sniffed_type(declared: &str, prefix: &[u8]) -> Result<(), ValidationError> {
    if prefix.is_empty() {
        return Err(ValidationError::EmptyFile);
    }
    match sniff(prefix) {
        Some(detected) if detected == declared => Ok(()),
        detected => Err(ValidationError::ContentMismatch {
            declared: declared.to_string(),
            detected: detected.unwrap_or("unknown").to_string(),
        }),
    }
}

/// File extension used when persisting an image of the given type.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        IMAGE_PNG => Some("png"),
        IMAGE_JPEG => Some("jpg"),
        _ => None,
    }
}
