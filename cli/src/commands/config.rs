use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::config::{load_config, save_config, OutputFormat};

#[derive(Subcommand, Clone)]
pub enum ConfigCommand {
    Show,
    Set {
        #[arg(value_enum)]
        key: ConfigKey,
        value: String,
    },
    Get {
        #[arg(value_enum)]
        key: ConfigKey,
    },
}

#[derive(clap::ValueEnum, Clone)]
pub enum ConfigKey {
    ServerUrl,
    OutputFormat,
    Log,
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let cfg = load_config()?;
                println!("{}", "Current configuration:".blue().bold());
                println!("  server_url: {}", cfg.server_url);
                println!("  output_format: {:?}", cfg.output_format);
                println!("  log: {}", cfg.log.as_deref().unwrap_or("off"));
            }
            ConfigCommand::Set { key, value } => {
                let mut cfg = load_config()?;
                match key {
                    ConfigKey::ServerUrl => {
                        cfg.server_url = value.trim_end_matches('/').to_string();
                        println!("{} server_url = {}", "Set".green(), cfg.server_url);
                    }
                    ConfigKey::OutputFormat => {
                        cfg.output_format = match value.to_lowercase().as_str() {
                            "table" => OutputFormat::Table,
                            "json" => OutputFormat::Json,
                            _ => anyhow::bail!("Invalid output format. Use 'table' or 'json'"),
                        };
                        println!("{} output_format = {}", "Set".green(), value);
                    }
                    ConfigKey::Log => {
                        let level = value.to_lowercase();
                        if !LOG_LEVELS.contains(&level.as_str()) {
                            anyhow::bail!(
                                "Invalid log level. Use one of: {}",
                                LOG_LEVELS.join(", ")
                            );
                        }
                        println!("{} log = {}", "Set".green(), level);
                        cfg.log = (level != "off").then_some(level);
                    }
                }
                save_config(&cfg)?;
            }
            ConfigCommand::Get { key } => {
                let cfg = load_config()?;
                match key {
                    ConfigKey::ServerUrl => println!("{}", cfg.server_url),
                    ConfigKey::OutputFormat => println!("{:?}", cfg.output_format),
                    ConfigKey::Log => println!("{}", cfg.log.as_deref().unwrap_or("off")),
                }
            }
        }
        Ok(())
    }
}
