//! Clipdock Processing Library
//!
//! Everything that touches an uploaded file between the HTTP boundary and
//! blob storage: staging files on disk, content-type checks, stream
//! inspection with ffprobe and faststart remuxing with ffmpeg.

pub mod error;
pub mod normalize;
pub mod probe;
pub mod staging;
pub mod validator;

pub use error::ProcessingError;
pub use normalize::{FfmpegFaststart, MediaNormalizer};
pub use probe::{FfprobeInspector, MediaInspector, MediaProbe, ProbeStream};
pub use staging::{StagingArea, StagingError, UploadSession};
pub use validator::ValidationError;
