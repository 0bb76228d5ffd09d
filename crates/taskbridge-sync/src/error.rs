//! Sync-specific error types.

use taskbridge_jira::JiraError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] JiraError),

    #[error("Malformed issue key: {0:?}")]
    MalformedKey(String),

    #[error("Malformed task file {path}: {reason}")]
    MalformedTaskFile { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// User-friendly error message for terminal output.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote(e) => e.user_message(),
            Self::MalformedKey(key) => format!("Issue key {:?} has no numeric part.", key),
            Self::MalformedTaskFile { path, reason } => {
                format!("{} is not a valid task file: {}", path, reason)
            }
            Self::Io(_) => "A file operation failed. Check paths and permissions.".to_string(),
        }
    }
}
