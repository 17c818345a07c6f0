//! Remote backup commands.
//!
//! `connect` runs the OAuth redirect through a short-lived loopback server:
//! the provider sends the browser to `http://127.0.0.1:<port>/callback`, the
//! server hands the raw query to the credential manager and shuts down.

use axum::{extract::RawQuery, response::Html, routing::get, Router};
use clap::{Args, Subcommand};
use fitlog_core::{AuthError, ConnectionState, SyncError};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use super::OutputFormat;
use crate::config::Config;
use crate::sync::{self, NotConfigured};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>FitLog - Authorization</title></head>
<body>
<h1>Authorization received</h1>
<p>You can close this window and return to the terminal.</p>
</body>
</html>"#;

/// Remote backup commands
#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: SyncSubcommand,
}

#[derive(Subcommand)]
enum SyncSubcommand {
    /// Grant access to your cloud drive (opens an authorization URL)
    Connect {
        /// Local port for the authorization callback (0 picks a free port)
        #[arg(long, default_value = "0")]
        port: u16,
    },

    /// Show sync status
    Status {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Upload all local data, replacing the remote backup
    Upload,

    /// Replace all local data with the remote backup
    Download {
        /// Only show what the backup contains
        #[arg(long)]
        dry_run: bool,
    },

    /// Turn on automatic upload after changes
    Enable,

    /// Turn off automatic upload (keeps the connection)
    Disable,

    /// Revoke access and forget all sync state
    Disconnect,
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    /// I/O error
    IoError(io::Error),
    /// No OAuth client configured
    NotConfigured(NotConfigured),
    /// Authorization failed
    Auth(AuthError),
    /// Upload or download failed
    Sync(SyncError),
    /// Timeout waiting for callback
    Timeout,
    /// Sync is not connected
    NotConnected,
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::IoError(e) => write!(f, "I/O error: {}", e),
            SyncCommandError::NotConfigured(e) => write!(f, "{}", e),
            SyncCommandError::Auth(e) => write!(f, "{}", e),
            SyncCommandError::Sync(e) => write!(f, "{}", e),
            SyncCommandError::Timeout => write!(f, "Timed out waiting for authorization"),
            SyncCommandError::NotConnected => {
                write!(f, "Not connected. Run 'fitlog sync connect' first.")
            }
        }
    }
}

impl std::error::Error for SyncCommandError {}

impl From<io::Error> for SyncCommandError {
    fn from(e: io::Error) -> Self {
        SyncCommandError::IoError(e)
    }
}

impl From<NotConfigured> for SyncCommandError {
    fn from(e: NotConfigured) -> Self {
        SyncCommandError::NotConfigured(e)
    }
}

impl From<AuthError> for SyncCommandError {
    fn from(e: AuthError) -> Self {
        SyncCommandError::Auth(e)
    }
}

impl From<SyncError> for SyncCommandError {
    fn from(e: SyncError) -> Self {
        SyncCommandError::Sync(e)
    }
}

impl SyncCommand {
    pub fn run(&self, config: &Config) -> Result<(), SyncCommandError> {
        let rt = tokio::runtime::Runtime::new()?;

        match &self.command {
            SyncSubcommand::Connect { port } => rt.block_on(connect(config, *port)),
            SyncSubcommand::Status { format } => status(config, format),
            SyncSubcommand::Upload => rt.block_on(upload(config)),
            SyncSubcommand::Download { dry_run } => rt.block_on(download(config, *dry_run)),
            SyncSubcommand::Enable => set_enabled(config, true),
            SyncSubcommand::Disable => set_enabled(config, false),
            SyncSubcommand::Disconnect => rt.block_on(disconnect(config)),
        }
    }
}

/// Interactive authorization flow
async fn connect(config: &Config, port: u16) -> Result<(), SyncCommandError> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let local_port = listener.local_addr()?.port();
    let redirect_uri = format!("http://127.0.0.1:{}/callback", local_port);

    let credentials = sync::credentials(config, &redirect_uri)?;
    let request = credentials.connect()?;

    let (tx, rx) = oneshot::channel::<String>();
    let tx = Arc::new(Mutex::new(Some(tx)));

    let server_handle = tokio::spawn(async move {
        let app = Router::new().route(
            "/callback",
            get(move |RawQuery(query): RawQuery| {
                let tx = tx.clone();
                async move {
                    if let Some(tx) = tx.lock().ok().and_then(|mut guard| guard.take()) {
                        let _ = tx.send(query.unwrap_or_default());
                    }
                    Html(CALLBACK_PAGE)
                }
            }),
        );

        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Callback server failed: {}", e);
        }
    });

    println!("Open this URL in your browser to grant access:\n");
    println!("{}\n", request.url);
    println!("Waiting for authorization (timeout: 5 minutes)");

    let result = tokio::time::timeout(CALLBACK_TIMEOUT, rx).await;
    server_handle.abort();

    let query = match result {
        Ok(Ok(query)) => query,
        Ok(Err(_)) | Err(_) => return Err(SyncCommandError::Timeout),
    };
    tracing::debug!("Received authorization callback on port {}", local_port);

    credentials
        .handle_callback(&format!("{}?{}", redirect_uri, query))
        .await?;

    println!(
        "Connected. Backups are stored in '{}' on your drive.",
        config.sync.drive_config().folder_name
    );
    Ok(())
}

fn status(config: &Config, format: &OutputFormat) -> Result<(), SyncCommandError> {
    let engine = match sync::engine(config) {
        Ok(engine) => engine,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };
    let status = engine.status();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "enabled": status.enabled,
                "connection": status.connection,
                "lastSync": status.last_sync,
                "autoSync": config.sync.auto_sync,
            });
            println!("{:#}", json);
        }
        OutputFormat::Text => {
            println!("Connection: {}", status.connection);
            println!("Enabled:    {}", if status.enabled { "yes" } else { "no" });
            println!("Auto-sync:  {}", if config.sync.auto_sync { "on" } else { "off" });
            match status.last_sync {
                Some(at) => println!("Last sync:  {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
                None => println!("Last sync:  never"),
            }
            if !status.connection.is_connected() {
                println!("\nRun 'fitlog sync connect' to set up backups.");
            }
        }
    }
    Ok(())
}

async fn upload(config: &Config) -> Result<(), SyncCommandError> {
    let engine = sync::engine(config)?;
    let repo = sync::open_repository(config);

    let report = engine.upload_data(&repo).await?;
    println!(
        "Uploaded backup at {}",
        report.sync_date.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

async fn download(config: &Config, dry_run: bool) -> Result<(), SyncCommandError> {
    let engine = sync::engine(config)?;

    let snapshot = if dry_run {
        engine.download_data().await?
    } else {
        let repo = sync::open_repository(config);
        engine.restore(&repo).await?
    };

    let verb = if dry_run { "Backup contains" } else { "Restored" };
    println!(
        "{} {} workouts, {} routines, {} food days (saved {})",
        verb,
        snapshot.workouts.len(),
        snapshot.routines.len(),
        snapshot.food_diary.len(),
        snapshot.sync_date.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

fn set_enabled(config: &Config, enabled: bool) -> Result<(), SyncCommandError> {
    let engine = sync::engine(config)?;
    if enabled && !engine.tokens().state().is_connected() {
        return Err(SyncCommandError::NotConnected);
    }
    if !engine.set_enabled(enabled) {
        return Err(SyncCommandError::IoError(io::Error::other(
            "failed to save sync setting",
        )));
    }
    println!("Sync {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

async fn disconnect(config: &Config) -> Result<(), SyncCommandError> {
    let engine = sync::engine(config)?;
    let was_connected = engine.tokens().state() != ConnectionState::Disconnected;
    engine.tokens().disconnect().await;

    if was_connected {
        println!("Disconnected. Local data is kept; the remote backup is not deleted.");
    } else {
        println!("Already disconnected.");
    }
    Ok(())
}
