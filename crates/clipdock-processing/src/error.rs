use std::path::PathBuf;

/// Failures of the external media tools. All of these are terminal for the
/// request and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Invalid tool path: {0}")]
    InvalidToolPath(String),

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Malformed probe output: {0}")]
    MalformedOutput(String),

    #[error("Probe reported no streams")]
    NoStreams,

    #[error("No video stream with dimensions found")]
    NoVideoStream,

    #[error("Expected output missing or empty: {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
