//! Single-column encoding of a blob location.
//!
//! The store keeps `(bucket, key)` as `"<bucket>,<key>"`. Bucket names
//! cannot contain commas, so the first comma is the separator.

use clipdock_core::models::BlobLocation;
use clipdock_core::AppError;

pub fn encode_location(location: &BlobLocation) -> String {
    format!("{},{}", location.bucket, location.key)
}

pub fn decode_location(stored: &str) -> Result<BlobLocation, AppError> {
    match stored.split_once(',') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => {
            Ok(BlobLocation::new(bucket, key))
        }
        _ => Err(AppError::Internal(format!(
            "Malformed stored video location: {:?}",
            stored
        ))),
    }
}
