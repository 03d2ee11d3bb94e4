use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Where an uploaded video lives in the blob store.
///
/// Records keep this pair rather than a resolved URL; access URLs are
/// minted per read and expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobLocation {
    pub bucket: String,
    pub key: String,
}

impl BlobLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl Display for BlobLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_location: Option<BlobLocation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// A fresh draft with no media attached yet.
    pub fn draft(user_id: Uuid, title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            description,
            thumbnail_url: None,
            video_location: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Client-facing view of a record. `video_url` is signed at read time.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    pub fn from_video(video: Video, video_url: Option<String>) -> Self {
        Self {
            id: video.id,
            user_id: video.user_id,
            title: video.title,
            description: video.description,
            thumbnail_url: video.thumbnail_url,
            video_url,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VideoUploadResponse {
    #[serde(rename = "videoID")]
    pub video_id: Uuid,
}
