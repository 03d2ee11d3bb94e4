use crate::location::{decode_location, encode_location};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clipdock_core::models::Video;
use clipdock_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Persistence for video records.
///
/// The repository does not enforce ownership; callers check
/// [`Video::is_owned_by`] before mutating.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create(&self, video: &Video) -> Result<Video, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Overwrite the mutable fields of an existing record.
    async fn update(&self, video: &Video) -> Result<Video, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    thumbnail_url: Option<String>,
    video_location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VideoRow> for Video {
    type Error = AppError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let video_location = row
            .video_location
            .as_deref()
            .map(decode_location)
            .transpose()?;
        Ok(Video {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            thumbnail_url: row.thumbnail_url,
            video_location,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self, video), fields(db.table = "videos", video_id = %video.id))]
    async fn create(&self, video: &Video) -> Result<Video, AppError> {
        let row: VideoRow = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            INSERT INTO videos (
                id, user_id, title, description,
                thumbnail_url, video_location, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(video.id)
        .bind(video.user_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(video.video_location.as_ref().map(encode_location))
        .bind(video.created_at)
        .bind(video.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos"))]
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let row: Option<VideoRow> =
            sqlx::query_as::<Postgres, VideoRow>("SELECT * FROM videos WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Video::try_from).transpose()
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", video_id = %video.id))]
    async fn update(&self, video: &Video) -> Result<Video, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            UPDATE videos
            SET title = $2,
                description = $3,
                thumbnail_url = $4,
                video_location = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(video.video_location.as_ref().map(encode_location))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(AppError::NotFound(format!("Video {} not found", video.id))),
        }
    }
}
