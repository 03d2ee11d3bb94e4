//! Configuration module
//!
//! Settings are read once at startup from the environment (and an optional
//! `.env` file), validated, and then shared read-only.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_VIDEO_SIZE_MB: u64 = 1024;
const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
const SIGNED_URL_TTL_SECS: u64 = 3600;
const UPLOAD_TIMEOUT_SECS: u64 = 300;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const LOG_FILTER: &str = "clipdock=debug,tower_http=debug";
const MB: u64 = 1024 * 1024;

/// Server, auth and database settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    /// Host name used when building absolute asset URLs
    pub public_host: String,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Maximum number of requests in flight at once
    pub http_concurrency_limit: usize,
    /// `json` or `compact`
    pub log_format: String,
    /// `EnvFilter` directives
    pub log_filter: String,
}

/// Storage, tooling and upload-limit settings
#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub storage_backend: StorageBackend,
    /// Bucket every video is written to. With the local backend this is a
    /// directory under `local_storage_path`.
    pub s3_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    /// HMAC key for locally signed blob URLs
    pub url_signing_secret: String,
    pub staging_dir: PathBuf,
    pub assets_root: PathBuf,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    pub signed_url_ttl_secs: u64,
    pub upload_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub media: MediaConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable must be set"))?;

        let base = BaseConfig {
            server_port: env_or("PORT", SERVER_PORT),
            public_host: env::var("PUBLIC_HOST").unwrap_or_else(|_| "localhost".to_string()),
            cors_origins,
            environment,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "clipdock-access".to_string()),
            jwt_secret: jwt_secret.clone(),
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            http_concurrency_limit: env_or("HTTP_CONCURRENCY_LIMIT", HTTP_CONCURRENCY_LIMIT),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
            log_filter: env::var("RUST_LOG").unwrap_or_else(|_| LOG_FILTER.to_string()),
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::from_str(&value)?,
            Err(_) => StorageBackend::S3,
        };

        let media = MediaConfig {
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").unwrap_or_default(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            url_signing_secret: env::var("URL_SIGNING_SECRET").unwrap_or(jwt_secret),
            staging_dir: env::var("STAGING_DIR")
                .unwrap_or_else(|_| "./temp".to_string())
                .into(),
            assets_root: env::var("ASSETS_ROOT")
                .unwrap_or_else(|_| "./assets".to_string())
                .into(),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            max_video_size_bytes: mb_to_bytes(
                "MAX_VIDEO_SIZE_MB",
                env_or("MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB),
            )?,
            max_thumbnail_size_bytes: mb_to_bytes(
                "MAX_THUMBNAIL_SIZE_MB",
                env_or("MAX_THUMBNAIL_SIZE_MB", MAX_THUMBNAIL_SIZE_MB),
            )?,
            signed_url_ttl_secs: env_or("SIGNED_URL_TTL_SECS", SIGNED_URL_TTL_SECS),
            upload_timeout_secs: env_or("UPLOAD_TIMEOUT_SECS", UPLOAD_TIMEOUT_SECS),
        };

        let config = Config { base, media };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.base.database_url.starts_with("postgres://")
            && !self.base.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.media.s3_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("S3_BUCKET must be set"));
        }

        match self.media.storage_backend {
            StorageBackend::S3 => {
                if self.media.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.media.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.media.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.media.max_video_size_bytes == 0 || self.media.max_thumbnail_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be greater than zero"));
        }

        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!(
                "HTTP_CONCURRENCY_LIMIT must be greater than zero"
            ));
        }

        if !matches!(self.base.log_format.to_lowercase().as_str(), "json" | "compact") {
            return Err(anyhow::anyhow!(
                "LOG_FORMAT must be 'json' or 'compact', got '{}'",
                self.base.log_format
            ));
        }

        if self.media.signed_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than zero"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.base.http_concurrency_limit
    }

    /// Whether log lines are emitted as JSON objects
    pub fn log_json(&self) -> bool {
        self.base.log_format.eq_ignore_ascii_case("json")
    }

    pub fn log_filter(&self) -> &str {
        &self.base.log_filter
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.base.jwt_secret
    }

    pub fn jwt_issuer(&self) -> &str {
        &self.base.jwt_issuer
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.base.database_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.media.storage_backend
    }

    pub fn bucket(&self) -> &str {
        &self.media.s3_bucket
    }

    pub fn staging_dir(&self) -> &PathBuf {
        &self.media.staging_dir
    }

    pub fn assets_root(&self) -> &PathBuf {
        &self.media.assets_root
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.media.max_video_size_bytes
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.media.max_thumbnail_size_bytes
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.media.signed_url_ttl_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.media.upload_timeout_secs)
    }

    /// Absolute URL under which a file in the assets directory is served.
    pub fn asset_url(&self, file_name: &str) -> String {
        format!(
            "http://{}:{}/assets/{}",
            self.base.public_host, self.base.server_port, file_name
        )
    }
}

fn mb_to_bytes(name: &str, megabytes: u64) -> Result<u64, anyhow::Error> {
    megabytes
        .checked_mul(MB)
        .ok_or_else(|| anyhow::anyhow!("{} is too large: {} MiB", name, megabytes))
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
