//! Bounded reads from a multipart file field.

use crate::error::HttpAppError;
use axum::extract::multipart::Field;
use bytes::{Bytes, BytesMut};
use clipdock_core::AppError;

/// Read whole chunks from `field` until at least `min_len` bytes are
/// buffered or the field ends.
pub async fn read_head(field: &mut Field<'_>, min_len: usize) -> Result<Vec<u8>, HttpAppError> {
    let mut head = Vec::with_capacity(min_len);
    while head.len() < min_len {
        match field.chunk().await? {
            Some(chunk) => head.extend_from_slice(&chunk),
            None => break,
        }
    }
    Ok(head)
}

/// Buffer the remainder of `field` in memory, failing once more than
/// `limit` bytes have been read.
pub async fn read_to_limit(mut field: Field<'_>, limit: u64) -> Result<Bytes, HttpAppError> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if (data.len() + chunk.len()) as u64 > limit {
            return Err(HttpAppError(AppError::PayloadTooLarge(format!(
                "File exceeds the {} byte limit",
                limit
            ))));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data.freeze())
}
