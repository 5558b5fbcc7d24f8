//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ethoscan - client for the AI Ethics risk predictor & red-team service
///
/// Register model metadata records, run risk predictions, adversarial
/// red-team probes and bias/misinformation/deepfake audits, and audit
/// ad-hoc files. Results render as text or JSON.
///
/// Examples:
///   ethoscan list
///   ethoscan add "loan-scorer" --task classification --sensitive-features gender,age
///   ethoscan predict 3 --fail-on 7
///   ethoscan redteam 3 --attacks 8
///   ethoscan upload ./posts.csv
///   ethoscan report 12 -o audit.pdf
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Analysis service base URL
    ///
    /// Can also be set via ETHOSCAN_URL or .ethoscan.toml.
    #[arg(long, value_name = "URL", env = "ETHOSCAN_URL")]
    pub url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ethoscan.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List registered models
    List,

    /// Register a new model metadata record
    Add {
        /// Model name
        name: String,

        /// Free-form description
        #[arg(long, default_value = "")]
        description: String,

        /// Summary of the training dataset
        #[arg(long, default_value = "")]
        dataset_summary: String,

        /// Task, e.g. classification or text-generation
        #[arg(long, default_value = "")]
        task: String,

        /// Sensitive features present in the data (comma-separated)
        #[arg(long, value_name = "FEATURES", value_delimiter = ',')]
        sensitive_features: Vec<String>,
    },

    /// Delete a model and discard its in-session runs
    Delete {
        /// Model id
        id: i64,
    },

    /// Run predictive risk scoring for a model
    Predict {
        /// Model id
        id: i64,

        /// Exit with code 2 when severity reaches this level (0-10)
        ///
        /// Useful for CI pipelines gating on model risk.
        #[arg(long, value_name = "LEVEL")]
        fail_on: Option<u8>,
    },

    /// Run adversarial red-team probing for a model
    Redteam {
        /// Model id
        id: i64,

        /// Number of attack samples to request
        #[arg(long, value_name = "COUNT")]
        attacks: Option<usize>,
    },

    /// Run the bias/misinformation/deepfake audit for a model
    Audit {
        /// Model id
        id: i64,
    },

    /// Audit an ad-hoc file (csv, text, image or video)
    Upload {
        /// File to analyze
        file: Option<PathBuf>,
    },

    /// List the service-owned run history
    Runs,

    /// Download the PDF report for a run
    Report {
        /// Run id
        run_id: i64,

        /// Output file path (defaults to ethics_report_run_<id>.pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Generate a default .ethoscan.toml configuration file
    InitConfig,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Service URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Command::Predict {
            fail_on: Some(level),
            ..
        } = self.command
        {
            if level > 10 {
                return Err("--fail-on must be between 0 and 10".to_string());
            }
        }

        if let Command::Redteam {
            attacks: Some(0), ..
        } = self.command
        {
            return Err("--attacks must be at least 1".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
