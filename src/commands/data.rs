use clap::{Args, Subcommand};
use fitlog_core::SyncSnapshot;
use std::fs;
use std::path::PathBuf;

use crate::sync::Repository;

#[derive(Args)]
pub struct DataCommand {
    #[command(subcommand)]
    pub command: DataSubcommand,
}

#[derive(Subcommand)]
pub enum DataSubcommand {
    /// Write all local data to a JSON file (same format as the remote backup)
    Export {
        /// Output file, stdout if omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace all local data with the contents of a JSON export
    Import {
        file: PathBuf,
    },

    /// Delete all workouts, routines, food entries and the current workout
    Clear {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}

impl DataCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DataSubcommand::Export { output } => {
                let json = repo.export_snapshot().to_json()?;
                match output {
                    Some(path) => {
                        fs::write(path, json)?;
                        println!("Exported data to {}", path.display());
                    }
                    None => println!("{}", json),
                }
                Ok(())
            }

            DataSubcommand::Import { file } => {
                let raw = fs::read_to_string(file)
                    .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
                let snapshot = SyncSnapshot::from_json(&raw)
                    .map_err(|e| format!("Invalid backup format: {}", e))?;
                if !repo.import_snapshot(&snapshot) {
                    return Err("Failed to write imported data".into());
                }
                println!(
                    "Imported {} workouts, {} routines, {} food days",
                    snapshot.workouts.len(),
                    snapshot.routines.len(),
                    snapshot.food_diary.len()
                );
                Ok(())
            }

            DataSubcommand::Clear { yes } => {
                if !yes {
                    return Err("This deletes all local data. Re-run with --yes to confirm.".into());
                }
                if !repo.clear_all() {
                    return Err("Failed to clear local data".into());
                }
                println!("Cleared all local data");
                Ok(())
            }
        }
    }
}
