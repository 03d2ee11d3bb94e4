//! Clipdock HTTP API
//!
//! Axum routes for creating video records, uploading videos and thumbnails,
//! and reading records back with signed download URLs.

mod api_doc;
pub mod auth;
pub mod constants;
pub mod error;
mod handlers;
pub mod services;
pub mod setup;
pub mod state;
mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
