pub mod ingest;
pub mod multipart;
pub mod signed_url;
pub mod thumbnail;

pub use ingest::VideoIngestService;
pub use signed_url::SignedUrlResolver;
pub use thumbnail::ThumbnailService;
