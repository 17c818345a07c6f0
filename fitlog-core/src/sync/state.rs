//! Locally persisted sync state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub(crate) const ACCESS_TOKEN_KEY: &str = "sync.accessToken";
pub(crate) const REFRESH_TOKEN_KEY: &str = "sync.refreshToken";
pub(crate) const TOKEN_EXPIRY_KEY: &str = "sync.tokenExpiry";
pub(crate) const LAST_SYNC_KEY: &str = "sync.lastSync";
pub(crate) const FILE_ID_KEY: &str = "sync.fileId";
pub(crate) const FOLDER_ID_KEY: &str = "sync.folderId";
pub(crate) const ENABLED_KEY: &str = "sync.enabled";
pub(crate) const PKCE_VERIFIER_KEY: &str = "sync.pkceVerifier";
pub(crate) const OAUTH_STATE_KEY: &str = "sync.oauthState";

/// Every key removed on disconnect.
pub(crate) const ALL_KEYS: [&str; 9] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    TOKEN_EXPIRY_KEY,
    LAST_SYNC_KEY,
    FILE_ID_KEY,
    FOLDER_ID_KEY,
    ENABLED_KEY,
    PKCE_VERIFIER_KEY,
    OAUTH_STATE_KEY,
];

/// Where the credential lifecycle currently stands.
///
/// ```text
/// Disconnected -> Authorizing -> Connected -> NeedsRefresh -> Connected
///       ^______________ disconnect() from any state ______________|
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No credentials and no authorization in flight
    Disconnected,
    /// Redirected to the provider, waiting for the callback
    Authorizing,
    /// Holding an unexpired access token
    Connected,
    /// Access token expired; the refresh token will be used on next request
    NeedsRefresh,
}

impl ConnectionState {
    /// Whether a token can be produced without user interaction.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::NeedsRefresh)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Authorizing => write!(f, "authorizing"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::NeedsRefresh => write!(f, "connected (token refresh pending)"),
        }
    }
}

/// Summary shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub enabled: bool,
    pub connection: ConnectionState,
    pub last_sync: Option<DateTime<Utc>>,
}
