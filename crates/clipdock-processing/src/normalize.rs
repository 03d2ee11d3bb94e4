//! Faststart remux with ffmpeg.
//!
//! Moves the MP4 index (`moov` atom) to the front of the file so playback
//! can start before the download finishes. Streams are copied, not
//! re-encoded.

use crate::error::ProcessingError;
use crate::probe::validate_tool_path;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Rewrites `input` into `output` for progressive playback. `output` may
/// already exist and is overwritten.
#[async_trait]
pub trait MediaNormalizer: Send + Sync {
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), ProcessingError>;
}

pub struct FfmpegFaststart {
    ffmpeg_path: String,
}

impl FfmpegFaststart {
    pub fn new(ffmpeg_path: impl Into<String>) -> Result<Self, ProcessingError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(&ffmpeg_path)?;
        Ok(Self { ffmpeg_path })
    }
}

#[async_trait]
impl MediaNormalizer for FfmpegFaststart {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), ProcessingError> {
        let start = std::time::Instant::now();

        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProcessingError::Spawn {
                tool: "ffmpeg",
                source,
            })?;

        if !result.status.success() {
            return Err(ProcessingError::ToolFailed {
                tool: "ffmpeg",
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        ensure_output(output).await?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            "Faststart remux completed"
        );
        Ok(())
    }
}

/// A zero exit status is not enough; the output must exist and be non-empty.
pub async fn ensure_output(output: &Path) -> Result<(), ProcessingError> {
    match tokio::fs::metadata(output).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(ProcessingError::MissingOutput(output.to_path_buf())),
    }
}
