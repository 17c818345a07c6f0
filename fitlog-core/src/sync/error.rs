//! Sync error types.

use thiserror::Error;

use crate::snapshot::SnapshotError;

/// Errors from the OAuth flow. All of them mean the user has to act
/// (usually by connecting again); none are retried.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not connected to remote storage. Run the connect flow first.")]
    NotConnected,

    #[error("Invalid state parameter in authorization callback")]
    InvalidState,

    #[error("No pending authorization. Start the connect flow again.")]
    MissingVerifier,

    #[error("Authorization callback is missing '{0}'")]
    MissingParameter(&'static str),

    #[error("Authorization denied by provider: {0}")]
    Provider(String),

    #[error("Token request rejected: {0}")]
    TokenRequest(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to persist credentials locally")]
    Storage,
}

/// Errors that can occur during remote sync operations.
#[derive(Debug)]
pub enum SyncError {
    /// No usable credentials
    Auth(AuthError),
    /// Transport failure talking to the remote API
    Http(reqwest::Error),
    /// Remote API answered with a non-success status
    Api { status: u16, message: String },
    /// Downloaded payload is not a snapshot
    InvalidFormat(SnapshotError),
    /// No backup folder or file exists remotely
    NoBackup,
    /// Snapshot could not be serialized
    Serialization(serde_json::Error),
    /// Downloaded snapshot could not be written to the local store
    LocalStore,
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Auth(e) => write!(f, "{}", e),
            SyncError::Http(e) => write!(f, "HTTP error: {}", e),
            SyncError::Api { status, message } => {
                write!(f, "Remote storage error ({}): {}", status, message)
            }
            SyncError::InvalidFormat(e) => write!(f, "Invalid backup format: {}", e),
            SyncError::NoBackup => write!(f, "No backup found in remote storage"),
            SyncError::Serialization(e) => write!(f, "Failed to serialize snapshot: {}", e),
            SyncError::LocalStore => write!(f, "Failed to write restored data locally"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Auth(e) => Some(e),
            SyncError::Http(e) => Some(e),
            SyncError::InvalidFormat(e) => Some(e),
            SyncError::Serialization(e) => Some(e),
            SyncError::Api { .. } | SyncError::NoBackup | SyncError::LocalStore => None,
        }
    }
}

impl From<AuthError> for SyncError {
    fn from(e: AuthError) -> Self {
        SyncError::Auth(e)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Http(e)
    }
}

impl From<SnapshotError> for SyncError {
    fn from(e: SnapshotError) -> Self {
        SyncError::InvalidFormat(e)
    }
}
