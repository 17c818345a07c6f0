use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# fitlog configuration

# Directory holding your data (default: platform data dir, e.g. ~/.local/share/fitlog)
# data_dir: ~/.local/share/fitlog

# Cloud drive backup. Register an OAuth "desktop app" client with Google and
# paste its id here (or set FITLOG_CLIENT_ID / FITLOG_CLIENT_SECRET).
sync:
  # client_id: 1234567890-abc.apps.googleusercontent.com
  # client_secret: only needed for web application clients
  auto_sync: true
  # folder_name: FitLog Backup
  # file_name: fitlog-data.json
"#;

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                cli_config_path
                                    .unwrap_or_else(Config::default_config_path)
                                    .display()
                            );
                        }
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        let drive = config.sync.drive_config();
                        println!("sync:");
                        println!(
                            "  client_id: {}",
                            config.sync.client_id.as_deref().unwrap_or("(not set)")
                        );
                        println!(
                            "  client_secret: {}",
                            if config.sync.client_secret.is_some() {
                                "(set)"
                            } else {
                                "(not set)"
                            }
                        );
                        println!("  auto_sync: {}", config.sync.auto_sync);
                        println!("  folder_name: {}", drive.folder_name);
                        println!("  file_name: {}", drive.file_name);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'fitlog config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, DEFAULT_CONFIG).unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert!(config.sync.auto_sync);
        assert!(config.sync.client_id.is_none());
    }
}
