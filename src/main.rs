use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod sync;

use commands::{
    ConfigCommand, DataCommand, DataSubcommand, FoodCommand, FoodSubcommand, RoutineCommand,
    RoutineSubcommand, SyncCommand, WorkoutCommand, WorkoutSubcommand,
};
use config::Config;
use sync::{open_repository, try_auto_sync};

#[derive(Parser)]
#[command(name = "fitlog")]
#[command(version)]
#[command(about = "Local-first workout and food log with cloud drive backup", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the current workout and browse finished ones
    Workout(WorkoutCommand),

    /// Manage saved routines
    Routine(RoutineCommand),

    /// Log food and view daily totals
    Food(FoodCommand),

    /// Export, import or clear local data
    Data(DataCommand),

    /// Back up to and restore from your cloud drive
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;
    tracing::debug!("Using data directory {}", config.data_dir.value.display());

    let result = execute_command(&cli.command, &config, cli_config_path);

    // Upload AFTER write commands (only if command succeeded)
    if result.is_ok() && is_write_command(&cli.command) {
        try_auto_sync(&config);
    }

    result
}

fn execute_command(
    command: &Option<Commands>,
    config: &Config,
    cli_config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Some(Commands::Workout(cmd)) => {
            cmd.run(&open_repository(config))?;
        }
        Some(Commands::Routine(cmd)) => {
            cmd.run(&open_repository(config))?;
        }
        Some(Commands::Food(cmd)) => {
            cmd.run(&open_repository(config))?;
        }
        Some(Commands::Data(cmd)) => {
            cmd.run(&open_repository(config))?;
        }
        Some(Commands::Sync(cmd)) => {
            cmd.run(config)?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(config, cli_config_path)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// Returns true if the command changes local data and should be followed by an upload.
fn is_write_command(cmd: &Option<Commands>) -> bool {
    matches!(
        cmd,
        Some(Commands::Workout(w)) if matches!(w.command,
            WorkoutSubcommand::Add { .. }
            | WorkoutSubcommand::Remove { .. }
            | WorkoutSubcommand::Finish { .. }
            | WorkoutSubcommand::Discard
            | WorkoutSubcommand::Delete { .. })
    ) || matches!(
        cmd,
        Some(Commands::Routine(r)) if matches!(r.command,
            RoutineSubcommand::Save { .. }
            | RoutineSubcommand::Load { .. }
            | RoutineSubcommand::Delete { .. })
    ) || matches!(
        cmd,
        Some(Commands::Food(f)) if matches!(f.command,
            FoodSubcommand::Add { .. } | FoodSubcommand::Delete { .. })
    ) || matches!(
        cmd,
        Some(Commands::Data(d)) if matches!(d.command,
            DataSubcommand::Import { .. } | DataSubcommand::Clear { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Option<Commands> {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_write_commands_trigger_sync() {
        assert!(is_write_command(&parse(&[
            "fitlog", "workout", "add", "Bench", "--set", "60x8"
        ])));
        assert!(is_write_command(&parse(&[
            "fitlog", "food", "add", "Rice", "--meal", "lunch", "--calories", "200"
        ])));
        assert!(is_write_command(&parse(&["fitlog", "routine", "load", "1700000000000"])));
        assert!(is_write_command(&parse(&["fitlog", "data", "clear", "--yes"])));
    }

    #[test]
    fn test_read_commands_do_not_sync() {
        assert!(!is_write_command(&parse(&["fitlog", "workout", "list"])));
        assert!(!is_write_command(&parse(&["fitlog", "food", "stats"])));
        assert!(!is_write_command(&parse(&["fitlog", "sync", "upload"])));
        assert!(!is_write_command(&parse(&["fitlog", "data", "export"])));
        assert!(!is_write_command(&None));
    }

    #[test]
    fn test_rejects_bad_meal_type() {
        assert!(Cli::try_parse_from(["fitlog", "food", "add", "Rice", "--meal", "brunch"]).is_err());
    }
}
