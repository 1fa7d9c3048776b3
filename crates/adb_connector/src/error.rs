//! Error types for adb operations

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdbError {
    #[error("No device detected")]
    NoDevice,

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("adb is not available: {0}")]
    BridgeUnavailable(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Action '{action}' is not supported, choose one of: {}", supported.join(", "))]
    UnsupportedAction {
        action: String,
        supported: Vec<String>,
    },

    #[error("No such apk file: {}", .0.display())]
    ApkNotFound(PathBuf),

    #[error("Invalid gesture sequence: {0}")]
    InvalidSequence(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl AdbError {
    /// True for failures of the external process itself, as opposed to
    /// failures to interpret its output.
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            AdbError::CommandFailed(_) | AdbError::BridgeUnavailable(_) | AdbError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AdbError>;
