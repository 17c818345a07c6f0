use clap::{Args, Subcommand};
use fitlog_core::EntityId;

use super::OutputFormat;
use crate::sync::Repository;

#[derive(Args)]
pub struct RoutineCommand {
    #[command(subcommand)]
    pub command: RoutineSubcommand,
}

#[derive(Subcommand)]
pub enum RoutineSubcommand {
    /// Save the exercises of the current workout as a routine
    Save {
        /// Routine name
        name: String,
    },

    /// List routines
    List {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a routine
    Show {
        id: EntityId,

        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Start a new workout from a routine (replaces the current workout)
    Load {
        id: EntityId,
    },

    /// Delete a routine
    Delete {
        id: EntityId,
    },
}

impl RoutineCommand {
    pub fn run(&self, repo: &Repository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            RoutineSubcommand::Save { name } => {
                let draft = repo.current_draft();
                if draft.is_empty() {
                    return Err("The current workout has no exercises to save".into());
                }
                let routine = repo
                    .save_routine(name, draft.exercises)
                    .ok_or("Routine name cannot be empty")?;
                println!(
                    "Saved routine '{}' ({}) with {} exercise(s)",
                    routine.name,
                    routine.id,
                    routine.exercises.len()
                );
                Ok(())
            }

            RoutineSubcommand::List { format } => {
                let routines = repo.all_routines();
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&routines)?);
                    }
                    OutputFormat::Text => {
                        if routines.is_empty() {
                            println!("No routines found.");
                            return Ok(());
                        }
                        println!("{:<15} {:<30} {:>9}", "ID", "NAME", "EXERCISES");
                        println!("{}", "-".repeat(56));
                        for routine in &routines {
                            let name = if routine.name.chars().count() > 28 {
                                let truncated: String = routine.name.chars().take(25).collect();
                                format!("{}...", truncated)
                            } else {
                                routine.name.clone()
                            };
                            println!(
                                "{:<15} {:<30} {:>9}",
                                routine.id,
                                name,
                                routine.exercises.len()
                            );
                        }
                    }
                }
                Ok(())
            }

            RoutineSubcommand::Show { id, format } => {
                let routine = repo
                    .routine(*id)
                    .ok_or_else(|| format!("Routine not found: {}", id))?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&routine)?),
                    OutputFormat::Text => print!("{}", routine),
                }
                Ok(())
            }

            RoutineSubcommand::Load { id } => {
                let draft = repo
                    .load_routine(*id)
                    .ok_or_else(|| format!("Routine not found: {}", id))?;
                println!(
                    "Started workout with {} exercise(s) from routine {}",
                    draft.exercises.len(),
                    id
                );
                Ok(())
            }

            RoutineSubcommand::Delete { id } => {
                if !repo.delete_routine(*id) {
                    return Err(format!("Routine not found: {}", id).into());
                }
                println!("Deleted routine {}", id);
                Ok(())
            }
        }
    }
}
