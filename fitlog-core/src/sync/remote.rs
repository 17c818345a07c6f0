//! Whole-snapshot backup to a cloud drive folder.
//!
//! The engine keeps exactly one JSON file inside one dedicated folder. Upload
//! overwrites it with the current local state; download reads it back. There
//! is no merge: whichever side wrote last wins.

use chrono::{DateTime, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::credentials::AccessTokenSource;
use super::error::SyncError;
use super::state::{SyncStatus, ENABLED_KEY, FILE_ID_KEY, FOLDER_ID_KEY, LAST_SYNC_KEY};
use crate::clock::{Clock, SystemClock};
use crate::repository::DocumentRepository;
use crate::snapshot::SyncSnapshot;
use crate::store::KeyValueStore;

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
pub const DEFAULT_FOLDER_NAME: &str = "FitLog Backup";
pub const DEFAULT_FILE_NAME: &str = "fitlog-data.json";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const JSON_MIME_TYPE: &str = "application/json";

/// Remote API endpoints and backup naming.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub api_base: String,
    pub upload_base: String,
    pub folder_name: String,
    pub file_name: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
            folder_name: DEFAULT_FOLDER_NAME.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

impl DriveConfig {
    pub fn with_folder_name(mut self, folder_name: impl Into<String>) -> Self {
        self.folder_name = folder_name.into();
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    pub file_id: String,
    pub sync_date: DateTime<Utc>,
}

/// Result of a background sync attempt. Never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoSyncOutcome {
    /// Sync disabled or not connected
    Skipped,
    Uploaded,
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct FileMetadata {
    id: String,
    #[serde(default)]
    trashed: bool,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileMetadata>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Uploads and downloads [`SyncSnapshot`]s.
pub struct RemoteSyncEngine<S, T> {
    store: S,
    tokens: T,
    config: DriveConfig,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore, T: AccessTokenSource> RemoteSyncEngine<S, T> {
    pub fn new(store: S, tokens: T, config: DriveConfig) -> Self {
        Self::with_clock(store, tokens, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, tokens: T, config: DriveConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            tokens,
            config,
            http: reqwest::Client::new(),
            clock,
        }
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.store.get::<bool>(ENABLED_KEY).unwrap_or(false)
    }

    /// Turns background sync on or off. Does not touch credentials.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.store.set(ENABLED_KEY, &enabled)
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.store.get(LAST_SYNC_KEY)
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            enabled: self.is_enabled(),
            connection: self.tokens.connection_state(),
            last_sync: self.last_sync(),
        }
    }

    /// Overwrites the remote backup with the full local state, creating the
    /// folder and file on first use.
    pub async fn upload_data<R: KeyValueStore>(
        &self,
        repo: &DocumentRepository<R>,
    ) -> Result<UploadReport, SyncError> {
        let token = self.tokens.access_token().await?;

        let snapshot = repo.export_snapshot();
        let body = snapshot.to_json().map_err(SyncError::Serialization)?;

        let folder_id = self.ensure_folder(&token).await?;
        let file_id = match self.find_file(&token, &folder_id).await? {
            Some(id) => id,
            None => self.create_file(&token, &folder_id).await?,
        };
        self.upload_content(&token, &file_id, body).await?;

        self.store.set(FILE_ID_KEY, &file_id);
        self.record_sync(snapshot.sync_date);

        tracing::info!(
            "Uploaded {} workouts, {} routines, {} food days",
            snapshot.workouts.len(),
            snapshot.routines.len(),
            snapshot.food_diary.len()
        );
        Ok(UploadReport {
            file_id,
            sync_date: snapshot.sync_date,
        })
    }

    /// Fetches the remote backup without applying it.
    pub async fn download_data(&self) -> Result<SyncSnapshot, SyncError> {
        let token = self.tokens.access_token().await?;

        let folder_id = self
            .find_folder(&token)
            .await?
            .ok_or(SyncError::NoBackup)?;
        let file_id = self
            .find_file(&token, &folder_id)
            .await?
            .ok_or(SyncError::NoBackup)?;

        let response = self
            .http
            .get(format!("{}/files/{}", self.config.api_base, file_id))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        let raw = check_status(response).await?.text().await?;
        let snapshot = SyncSnapshot::from_json(&raw)?;

        self.store.set(FILE_ID_KEY, &file_id);
        tracing::debug!("Downloaded snapshot from {}", snapshot.sync_date);
        Ok(snapshot)
    }

    /// Downloads the remote backup and replaces all local state with it.
    pub async fn restore<R: KeyValueStore>(
        &self,
        repo: &DocumentRepository<R>,
    ) -> Result<SyncSnapshot, SyncError> {
        let snapshot = self.download_data().await?;
        if !repo.import_snapshot(&snapshot) {
            return Err(SyncError::LocalStore);
        }
        self.record_sync(self.clock.now());

        tracing::info!("Restored local data from backup of {}", snapshot.sync_date);
        Ok(snapshot)
    }

    /// Uploads if sync is enabled and connected. Failures are logged and
    /// returned, never raised.
    pub async fn auto_sync<R: KeyValueStore>(
        &self,
        repo: &DocumentRepository<R>,
    ) -> AutoSyncOutcome {
        if !self.is_enabled() || !self.tokens.connection_state().is_connected() {
            return AutoSyncOutcome::Skipped;
        }

        match self.upload_data(repo).await {
            Ok(report) => {
                tracing::debug!("Auto-sync uploaded {}", report.file_id);
                AutoSyncOutcome::Uploaded
            }
            Err(e) => {
                tracing::warn!("Auto-sync failed: {}", e);
                AutoSyncOutcome::Failed(e.to_string())
            }
        }
    }

    fn record_sync(&self, at: DateTime<Utc>) {
        self.store.set(LAST_SYNC_KEY, &at);
    }

    // ==================== Folder and file resolution ====================

    async fn find_folder(&self, token: &str) -> Result<Option<String>, SyncError> {
        if let Some(cached) = self.cached_id(token, FOLDER_ID_KEY).await? {
            return Ok(Some(cached));
        }

        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query(&self.config.folder_name),
            FOLDER_MIME_TYPE
        );
        let found = self.search(token, &query).await?;
        if let Some(id) = &found {
            self.store.set(FOLDER_ID_KEY, id);
        }
        Ok(found)
    }

    async fn ensure_folder(&self, token: &str) -> Result<String, SyncError> {
        if let Some(id) = self.find_folder(token).await? {
            return Ok(id);
        }

        let id = self
            .create(
                token,
                serde_json::json!({
                    "name": self.config.folder_name,
                    "mimeType": FOLDER_MIME_TYPE,
                }),
            )
            .await?;
        self.store.set(FOLDER_ID_KEY, &id);

        tracing::info!("Created backup folder '{}'", self.config.folder_name);
        Ok(id)
    }

    async fn find_file(&self, token: &str, folder_id: &str) -> Result<Option<String>, SyncError> {
        if let Some(cached) = self.cached_id(token, FILE_ID_KEY).await? {
            return Ok(Some(cached));
        }

        let query = format!(
            "name = '{}' and '{}' in parents and trashed = false",
            escape_query(&self.config.file_name),
            escape_query(folder_id)
        );
        self.search(token, &query).await
    }

    async fn create_file(&self, token: &str, folder_id: &str) -> Result<String, SyncError> {
        let id = self
            .create(
                token,
                serde_json::json!({
                    "name": self.config.file_name,
                    "parents": [folder_id],
                    "mimeType": JSON_MIME_TYPE,
                }),
            )
            .await?;

        tracing::info!("Created backup file '{}'", self.config.file_name);
        Ok(id)
    }

    /// Returns the id cached under `key` if it still names a live item.
    /// A stale id is forgotten.
    async fn cached_id(&self, token: &str, key: &str) -> Result<Option<String>, SyncError> {
        let Some(cached) = self.store.get::<String>(key) else {
            return Ok(None);
        };

        let response = self
            .http
            .get(format!("{}/files/{}", self.config.api_base, cached))
            .bearer_auth(token)
            .query(&[("fields", "id,trashed")])
            .send()
            .await?;

        let live = if response.status() == StatusCode::NOT_FOUND {
            false
        } else {
            let metadata: FileMetadata = check_status(response).await?.json().await?;
            !metadata.trashed
        };

        if live {
            Ok(Some(cached))
        } else {
            tracing::debug!("Cached id under '{}' is gone, searching again", key);
            self.store.remove(key);
            Ok(None)
        }
    }

    async fn search(&self, token: &str, query: &str) -> Result<Option<String>, SyncError> {
        let response = self
            .http
            .get(format!("{}/files", self.config.api_base))
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("spaces", "drive"),
                ("fields", "files(id,trashed)"),
            ])
            .send()
            .await?;

        let list: FileList = check_status(response).await?.json().await?;
        Ok(list.files.into_iter().find(|f| !f.trashed).map(|f| f.id))
    }

    async fn create(&self, token: &str, metadata: serde_json::Value) -> Result<String, SyncError> {
        let response = self
            .http
            .post(format!("{}/files", self.config.api_base))
            .bearer_auth(token)
            .query(&[("fields", "id")])
            .json(&metadata)
            .send()
            .await?;

        let created: FileMetadata = check_status(response).await?.json().await?;
        Ok(created.id)
    }

    async fn upload_content(&self, token: &str, file_id: &str, body: String) -> Result<(), SyncError> {
        let response = self
            .http
            .patch(format!("{}/files/{}", self.config.upload_base, file_id))
            .bearer_auth(token)
            .query(&[("uploadType", "media")])
            .header(CONTENT_TYPE, JSON_MIME_TYPE)
            .body(body)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}

/// Maps a non-success response to [`SyncError::Api`], using the API's error
/// message when the body carries one.
async fn check_status(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());

    Err(SyncError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Escapes a literal for use inside single quotes in a search query.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
