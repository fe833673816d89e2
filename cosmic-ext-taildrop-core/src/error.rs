//! Error handling for COSMIC Taildrop
//!
//! Every failure the front-end can meet falls into one of three families:
//!
//! - [`QueryError`]: the device listing could not be produced (the tool failed
//!   to start, exited non-zero, or printed something that is not a status
//!   report). The destination list stays empty and the user may refresh.
//! - [`ValidationError`]: a send or receive was requested with incomplete
//!   input. These never reach the transfer invoker.
//! - [`TransferError`]: the tool reported a failed `file cp` / `file get`, or
//!   could not be launched. The invoker folds these into a failed
//!   [`TransferOutcome`](crate::TransferOutcome) so callers never see a fault.
//!
//! [`TaildropError`] wraps all of them for code that can meet more than one.
//!
//! ```rust
//! use cosmic_ext_taildrop_core::{TaildropError, ValidationError};
//!
//! let error: TaildropError = ValidationError::NoFiles.into();
//! assert_eq!(error.to_string(), "No files selected");
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Result type for fallible Taildrop operations
pub type Result<T> = std::result::Result<T, TaildropError>;

/// Device listing failed
#[derive(Error, Debug)]
pub enum QueryError {
    /// The status command could not be started at all
    #[error("Could not run tailscale status: {0}")]
    Launch(#[source] std::io::Error),

    /// The status command ran but exited with a failure code
    #[error("Failed to get device list: {}", describe_failure(.code, .stderr))]
    Failed { code: Option<i32>, stderr: String },

    /// The status command printed something that is not a status report
    #[error("Malformed status output: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A submission rejected before it reached the transfer invoker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No files selected")]
    NoFiles,

    #[error("No destination device selected")]
    NoDestination,

    #[error("No save directory specified")]
    NoReceiveDirectory,

    #[error("Invalid directory path: {}", .0.display())]
    InvalidReceiveDirectory(PathBuf),

    /// A transfer is already running
    #[error("A transfer is already in progress")]
    Busy,
}

/// A send or receive that the tool did not complete
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Could not start {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", describe_failure(.code, .stderr))]
    Failed { code: Option<i32>, stderr: String },
}

/// Umbrella error for the Taildrop front-end
#[derive(Error, Debug)]
pub enum TaildropError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Preferences file could not be read, parsed or written
    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for TaildropError {
    fn from(err: toml::de::Error) -> Self {
        Self::Preferences(err.to_string())
    }
}

impl From<toml::ser::Error> for TaildropError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Preferences(err.to_string())
    }
}

/// Diagnostic text for a failed tool run: stderr when there is any, else a
/// generic fallback that still carries the exit code
fn describe_failure(code: &Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    match code {
        Some(code) => format!("Unknown error (exit code {})", code),
        None => "Unknown error (terminated by signal)".to_string(),
    }
}
