//! Storage key derivation for uploaded videos.

use crate::traits::{StorageError, StorageResult};
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::fmt::{Display, Formatter, Result as FmtResult};

const KEY_ENTROPY_BYTES: usize = 16;
const VIDEO_EXTENSION: &str = "mp4";

/// Namespace partition derived from a video's display dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
    Other,
}

impl Orientation {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        match width.cmp(&height) {
            std::cmp::Ordering::Less => Orientation::Portrait,
            std::cmp::Ordering::Greater => Orientation::Landscape,
            std::cmp::Ordering::Equal => Orientation::Other,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait/",
            Orientation::Landscape => "landscape/",
            Orientation::Other => "other/",
        }
    }
}

/// A blob key of the form `<orientation prefix><32 hex chars>.mp4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey(String);

impl StorageKey {
    /// Draw a fresh key from the OS CSPRNG.
    pub fn generate(orientation: Orientation) -> StorageResult<Self> {
        let mut bytes = [0u8; KEY_ENTROPY_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| StorageError::Entropy(e.to_string()))?;
        Ok(Self::from_parts(orientation, &bytes))
    }

    fn from_parts(orientation: Orientation, entropy: &[u8]) -> Self {
        StorageKey(format!(
            "{}{}.{}",
            orientation.prefix(),
            hex::encode(entropy),
            VIDEO_EXTENSION
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
