//! On-disk staging for uploads.
//!
//! An [`UploadSession`] owns every file it creates in the staging directory.
//! Files are removed by [`UploadSession::close`] or, if the session is
//! dropped first (error path, cancelled request), by the drop of each
//! underlying [`TempPath`].

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};
use tokio::io::AsyncWriteExt;

const STAGED_PREFIX: &str = "upload-";
const STAGED_SUFFIX: &str = ".mp4";
const FASTSTART_SUFFIX: &str = "-faststart.mp4";

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Upload exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Failed to read upload body: {0}")]
    Body(String),

    #[error("No staged upload in this session")]
    NothingStaged,

    #[error("Staging IO error: {0}")]
    Io(#[from] io::Error),
}

/// The directory uploads are staged in.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Use `root` as the staging directory, creating it if needed.
    pub async fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn begin(&self) -> UploadSession {
        UploadSession {
            root: self.root.clone(),
            staged: None,
            sibling: None,
        }
    }
}

/// Request-scoped owner of staging files.
#[derive(Debug)]
pub struct UploadSession {
    root: PathBuf,
    staged: Option<TempPath>,
    sibling: Option<TempPath>,
}

impl UploadSession {
    /// Stream an upload into a fresh staging file.
    ///
    /// `head` holds bytes already read from the body (the sniffed prefix);
    /// they are written first, followed by the rest of `body`. The write
    /// stops with [`StagingError::TooLarge`] as soon as the total exceeds
    /// `limit`.
    pub async fn stage_upload<S, E>(
        &mut self,
        head: &[u8],
        mut body: S,
        limit: u64,
    ) -> Result<&Path, StagingError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        let named = Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(STAGED_SUFFIX)
            .tempfile_in(&self.root)?;
        let (file, path) = named.into_parts();
        // Owned from here on, so any early return below still removes it.
        let staged: &Path = self.staged.insert(path);

        let mut out = tokio::fs::File::from_std(file);
        let mut written = head.len() as u64;
        if written > limit {
            return Err(StagingError::TooLarge { limit });
        }
        out.write_all(head).await?;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| StagingError::Body(e.to_string()))?;
            written += chunk.len() as u64;
            if written > limit {
                return Err(StagingError::TooLarge { limit });
            }
            out.write_all(&chunk).await?;
        }
        out.flush().await?;

        tracing::debug!(
            path = %staged.display(),
            size_bytes = written,
            "Upload staged"
        );
        Ok(staged)
    }

    /// Path of the staged upload, if any.
    pub fn staged_path(&self) -> Option<&Path> {
        self.staged.as_deref()
    }

    /// Reserve a uniquely named file beside the staged upload, for a
    /// processing step to write its output into.
    pub fn reserve_sibling(&mut self) -> Result<PathBuf, StagingError> {
        if self.staged.is_none() {
            return Err(StagingError::NothingStaged);
        }
        let path = Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(FASTSTART_SUFFIX)
            .tempfile_in(&self.root)?
            .into_temp_path();
        let reserved = path.to_path_buf();
        // Replacing an earlier reservation drops (and deletes) it.
        self.sibling = Some(path);
        Ok(reserved)
    }

    /// Atomically rename the sibling over the staged upload. Afterwards only
    /// one file remains and [`UploadSession::staged_path`] holds the new
    /// content.
    pub fn promote_sibling(&mut self) -> Result<&Path, StagingError> {
        let staged = self.staged.as_deref().ok_or(StagingError::NothingStaged)?;
        let sibling = self.sibling.take().ok_or(StagingError::NothingStaged)?;
        sibling.persist(staged).map_err(|e| StagingError::Io(e.error))?;
        Ok(staged)
    }

    /// Remove every file owned by this session.
    pub fn close(mut self) {
        for path in [self.sibling.take(), self.staged.take()].into_iter().flatten() {
            let location = path.to_path_buf();
            if let Err(e) = path.close() {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(
                        error = %e,
                        path = %location.display(),
                        "Failed to remove staging file"
                    );
                }
            }
        }
    }
}
