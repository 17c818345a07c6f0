//! Auto-sync for CLI write commands.
//!
//! Uploads the local state after a successful write when `auto_sync` is on in
//! the config and sync is enabled and connected in the store.

use fitlog_core::AutoSyncOutcome;

use super::{engine, open_repository};
use crate::config::Config;

/// Performs auto-sync if enabled.
///
/// Any failure is reported on stderr and otherwise ignored, so the CLI keeps
/// working offline.
pub fn try_auto_sync(config: &Config) {
    if !config.sync.auto_sync {
        return;
    }

    // No client configured means sync was never set up
    let Ok(engine) = engine(config) else {
        return;
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(_) => return,
    };

    let repo = open_repository(config);
    match rt.block_on(engine.auto_sync(&repo)) {
        AutoSyncOutcome::Skipped | AutoSyncOutcome::Uploaded => {}
        AutoSyncOutcome::Failed(message) => {
            eprintln!("Auto-sync: {}", message);
        }
    }
}
