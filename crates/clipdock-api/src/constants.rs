//! Route prefixes and request-shape constants.

/// Prefix for authenticated JSON endpoints.
pub const API_PREFIX: &str = "/api";

/// Public mount point of the thumbnail assets directory.
pub const ASSETS_ROUTE: &str = "/assets";

/// Public mount point of locally stored blobs.
pub const BLOBS_ROUTE: &str = "/blobs";

/// Multipart field carrying the video file.
pub const VIDEO_FIELD: &str = "video";

/// Multipart field carrying the thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// Headroom on top of a file-size limit for multipart boundaries and part
/// headers, applied to whole-body limits.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;
