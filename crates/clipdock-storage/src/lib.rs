//! Clipdock Storage Library
//!
//! Blob storage for uploaded videos: the `BlobStore` trait, its S3 and local
//! filesystem backends, and storage key derivation.
//!
//! # Storage key format
//!
//! Video keys are `<orientation>/<32 hex chars>.mp4`, where the orientation
//! prefix is one of `portrait/`, `landscape/` or `other/`. The random part
//! comes from the OS CSPRNG. Keys never contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

pub use clipdock_core::StorageBackend;
pub use factory::{create_blob_store, BlobStores};
pub use keys::{Orientation, StorageKey};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{BlobStore, StorageError, StorageResult};
