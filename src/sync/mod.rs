//! Wiring between the CLI configuration and the core store and sync types.

mod auto_sync;

use fitlog_core::{DocumentRepository, FileStore, RemoteSyncEngine, SyncCredentialManager};

use crate::config::Config;

pub use auto_sync::try_auto_sync;

/// Redirect used when no authorization is in flight. Token refresh and
/// revocation never send it.
const IDLE_REDIRECT_URI: &str = "http://127.0.0.1/callback";

pub type Repository = DocumentRepository<FileStore>;
pub type Credentials = SyncCredentialManager<FileStore>;
pub type Engine = RemoteSyncEngine<FileStore, Credentials>;

fn open_store(config: &Config) -> FileStore {
    FileStore::new(config.data_dir.value.clone())
}

pub fn open_repository(config: &Config) -> Repository {
    DocumentRepository::new(open_store(config))
}

/// Credential manager for the given redirect URI.
pub fn credentials(config: &Config, redirect_uri: &str) -> Result<Credentials, NotConfigured> {
    let oauth = config.sync.oauth_config(redirect_uri).ok_or(NotConfigured)?;
    Ok(SyncCredentialManager::new(open_store(config), oauth))
}

pub fn engine(config: &Config) -> Result<Engine, NotConfigured> {
    let credentials = credentials(config, IDLE_REDIRECT_URI)?;
    Ok(RemoteSyncEngine::new(
        open_store(config),
        credentials,
        config.sync.drive_config(),
    ))
}

/// No OAuth client id configured
#[derive(Debug)]
pub struct NotConfigured;

impl std::fmt::Display for NotConfigured {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sync not configured. Set sync.client_id in the config file or FITLOG_CLIENT_ID."
        )
    }
}

impl std::error::Error for NotConfigured {}
