//! Remote backup of the local store.
//!
//! ## Flow
//!
//! 1. [`SyncCredentialManager::connect`] produces an authorization URL (PKCE)
//! 2. The provider redirects back; [`SyncCredentialManager::handle_callback`]
//!    stores the tokens
//! 3. [`RemoteSyncEngine`] uploads or downloads the whole local state as a
//!    single JSON snapshot, refreshing the access token as needed
//!
//! All sync state lives under `sync.*` keys in the same store as the data.

mod credentials;
mod error;
pub mod pkce;
mod remote;
mod state;

pub use credentials::{
    AccessTokenSource, AuthorizationRequest, CallbackOutcome, OAuthConfig, SyncCredentialManager,
    DRIVE_FILE_SCOPE,
};
pub use error::{AuthError, SyncError};
pub use remote::{
    AutoSyncOutcome, DriveConfig, RemoteSyncEngine, UploadReport, DEFAULT_FILE_NAME,
    DEFAULT_FOLDER_NAME,
};
pub use state::{ConnectionState, SyncStatus};
