//! Test fixtures: file bodies and multipart forms.

use axum_test::multipart::{MultipartForm, Part};

/// `ftyp` box of an ISO base media file, enough for content sniffing.
const MP4_FTYP: &[u8] = &[
    0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0x00, 0x00, 0x02, 0x00,
    b'i', b's', b'o', b'm', b'i', b's', b'o', b'2', b'm', b'p', b'4', b'1',
];

/// An MP4-looking file of `len` bytes (at least the `ftyp` box).
pub fn mp4_bytes(len: usize) -> Vec<u8> {
    let mut data = MP4_FTYP.to_vec();
    data.resize(len.max(MP4_FTYP.len()), 0xAB);
    data
}

/// Minimal valid 1x1 PNG bytes.
pub fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
        0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0x89, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}

/// JPEG start-of-image marker followed by a JFIF header.
pub fn jpeg_bytes() -> Vec<u8> {
    let mut data = vec![
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
        0x01, 0x00, 0x01, 0x00, 0x00,
    ];
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// A form with a single file field.
pub fn file_form(field: &str, data: Vec<u8>, file_name: &str, mime: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(file_name.to_string())
        .mime_type(mime.to_string());
    MultipartForm::new().add_part(field.to_string(), part)
}

pub fn video_form(data: Vec<u8>) -> MultipartForm {
    file_form("video", data, "clip.mp4", "video/mp4")
}

pub fn thumbnail_form(data: Vec<u8>, mime: &str) -> MultipartForm {
    file_form("thumbnail", data, "thumb", mime)
}
