//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ethoscan.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analysis service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Red-team settings.
    #[serde(default)]
    pub redteam: RedteamConfig,

    /// Upload audit settings.
    #[serde(default)]
    pub upload: UploadConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Analysis service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the analysis service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout() -> u64 {
    120 // generation-backed endpoints can be slow
}

/// Red-team probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedteamConfig {
    /// Number of attack samples to request per run.
    #[serde(default = "default_attacks")]
    pub attacks: usize,
}

impl Default for RedteamConfig {
    fn default() -> Self {
        Self {
            attacks: default_attacks(),
        }
    }
}

fn default_attacks() -> usize {
    5
}

/// Ad-hoc file audit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_file_size() -> usize {
    10 * 1024 * 1024 // matches the service's own cap
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Default report download directory.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            report_dir: default_report_dir(),
        }
    }
}

fn default_report_dir() -> String {
    ".".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".ethoscan.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.url {
            self.service.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(timeout) = args.timeout {
            self.service.timeout_seconds = timeout;
        }

        if let crate::cli::Command::Redteam {
            attacks: Some(attacks),
            ..
        } = args.command
        {
            self.redteam.attacks = attacks;
        }

        if args.verbose {
            self.output.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, Command, OutputFormat};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.service.timeout_seconds, 120);
        assert_eq!(config.redteam.attacks, 5);
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[service]
base_url = "https://ethics.example.com"
timeout_seconds = 30

[redteam]
attacks = 8

[output]
verbose = true
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.service.base_url, "https://ethics.example.com");
        assert_eq!(config.service.timeout_seconds, 30);
        assert_eq!(config.redteam.attacks, 8);
        assert!(config.output.verbose);
        // Untouched section keeps its defaults
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_merge_with_args_overrides() {
        let mut config = Config::default();
        let args = Args {
            command: Command::Redteam {
                id: 1,
                attacks: Some(12),
            },
            url: Some("http://ethics.internal:9000/".to_string()),
            config: None,
            timeout: Some(15),
            format: OutputFormat::Text,
            verbose: true,
            quiet: false,
        };

        config.merge_with_args(&args);
        assert_eq!(config.service.base_url, "http://ethics.internal:9000");
        assert_eq!(config.service.timeout_seconds, 15);
        assert_eq!(config.redteam.attacks, 12);
        assert!(config.output.verbose);
    }

    #[test]
    fn test_merge_without_cli_values_keeps_file_settings() {
        let mut config = Config::default();
        config.service.timeout_seconds = 45;
        let args = Args {
            command: Command::List,
            url: None,
            config: None,
            timeout: None,
            format: OutputFormat::Text,
            verbose: false,
            quiet: false,
        };

        config.merge_with_args(&args);
        assert_eq!(config.service.timeout_seconds, 45);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[service]"));
        assert!(toml_str.contains("[redteam]"));
        assert!(toml_str.contains("[upload]"));
    }
}
