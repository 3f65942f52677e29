use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

const APP_NAME: &str = "conduit";
const CONFIG_NAME: &str = "config";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub server_url: String,
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Log level written to stderr. Unset keeps logging off.
    #[serde(default)]
    pub log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".to_string(),
            output_format: OutputFormat::Table,
            log: None,
        }
    }
}

impl Config {
    pub fn log_level(&self) -> LevelFilter {
        match self
            .log
            .to_owned()
            .unwrap_or_else(|| "OFF".to_string())
            .to_uppercase()
            .as_str()
        {
            "TRACE" => LevelFilter::TRACE,
            "DEBUG" => LevelFilter::DEBUG,
            "INFO" => LevelFilter::INFO,
            "WARN" => LevelFilter::WARN,
            "ERROR" => LevelFilter::ERROR,
            _ => LevelFilter::OFF,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn load_config() -> Result<Config> {
    confy::load(APP_NAME, CONFIG_NAME).map_err(|e| {
        match confy::get_configuration_file_path(APP_NAME, CONFIG_NAME) {
            Ok(path) => anyhow::anyhow!("Fail load config from {}: {}", path.display(), e),
            Err(path_err) => anyhow::anyhow!(
                "Fail load config and couldn't determine config path: {} (path error: {})",
                e,
                path_err
            ),
        }
    })
}

pub fn save_config(config: &Config) -> Result<()> {
    confy::store(APP_NAME, CONFIG_NAME, config).map_err(
        |e| match confy::get_configuration_file_path(APP_NAME, CONFIG_NAME) {
            Ok(path) => anyhow::anyhow!("Fail save config to {}: {}", path.display(), e),
            Err(path_err) => anyhow::anyhow!(
                "Fail save config and couldn't determine config path: {} (path error: {})",
                e,
                path_err
            ),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_defaults_to_off() {
        assert_eq!(Config::default().log_level(), LevelFilter::OFF);
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let cfg = Config {
            log: Some("debug".to_string()),
            ..Config::default()
        };
        assert_eq!(cfg.log_level(), LevelFilter::DEBUG);
    }
}
