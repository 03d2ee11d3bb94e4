//! Clipdock Core Library
//!
//! Domain models, error types and configuration shared by every clipdock crate.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

pub use config::{BaseConfig, Config, MediaConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
