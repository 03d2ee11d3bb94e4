//! Stream inspection with ffprobe.

use crate::error::ProcessingError;
use async_trait::async_trait;
use clipdock_storage::Orientation;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

/// Reject tool paths that could smuggle shell syntax or climb directories.
pub(crate) fn validate_tool_path(path: &str) -> Result<(), ProcessingError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ProcessingError::InvalidToolPath(path.to_string()));
    }
    if path.contains("..") {
        return Err(ProcessingError::InvalidToolPath(path.to_string()));
    }
    if !path
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | '\\' | ':'))
    {
        return Err(ProcessingError::InvalidToolPath(path.to_string()));
    }
    Ok(())
}

/// One entry of ffprobe's `streams` array. Only the dimensions are used;
/// the rest is kept for logging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProbeStream {
    pub index: u32,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ProbeStream {
    fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaProbe {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

impl MediaProbe {
    pub fn from_json(raw: &[u8]) -> Result<Self, ProcessingError> {
        serde_json::from_slice(raw).map_err(|e| ProcessingError::MalformedOutput(e.to_string()))
    }

    /// Width and height of the first video stream that reports both.
    pub fn video_dimensions(&self) -> Result<(u32, u32), ProcessingError> {
        if self.streams.is_empty() {
            return Err(ProcessingError::NoStreams);
        }
        self.streams
            .iter()
            .filter(|s| s.is_video())
            .find_map(|s| s.width.zip(s.height))
            .ok_or(ProcessingError::NoVideoStream)
    }

    pub fn orientation(&self) -> Result<Orientation, ProcessingError> {
        let (width, height) = self.video_dimensions()?;
        Ok(Orientation::from_dimensions(width, height))
    }
}

/// Describes the streams of a staged media file.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaProbe, ProcessingError>;
}

pub struct FfprobeInspector {
    ffprobe_path: String,
}

impl FfprobeInspector {
    pub fn new(ffprobe_path: impl Into<String>) -> Result<Self, ProcessingError> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffprobe_path)?;
        Ok(Self { ffprobe_path })
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<MediaProbe, ProcessingError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProcessingError::Spawn {
                tool: "ffprobe",
                source,
            })?;

        if !output.status.success() {
            return Err(ProcessingError::ToolFailed {
                tool: "ffprobe",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let probe = MediaProbe::from_json(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            stream_count = probe.streams.len(),
            "Video probe completed"
        );

        Ok(probe)
    }
}
