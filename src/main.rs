//! Ethoscan - CLI client for the AI Ethics analysis service
//!
//! Registers model metadata records with a remote risk service and runs
//! predictive scoring, adversarial red-team probing and combined
//! bias/misinformation/deepfake audits against them, plus ad-hoc file
//! audits and PDF report downloads.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, analysis failure, etc.)
//!   2 - Severity at or above --fail-on threshold

mod cli;
mod client;
mod config;
mod error;
mod models;
mod present;
mod render;
mod risk;
mod session;
mod upload;

use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use client::{AnalysisService, ApiClient};
use config::Config;
use models::{ModelFields, RunKind};
use session::{ModelRegistry, Orchestrator, RunOutcome, RunStatus, Session};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use upload::UploadAuditPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Ethoscan v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_command(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .ethoscan.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".ethoscan.toml");

    if path.exists() {
        eprintln!("⚠️  .ethoscan.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .ethoscan.toml")?;

    println!("✅ Created .ethoscan.toml with default settings.");
    println!("   Edit it to customize the service URL, timeouts and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .ethoscan.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Dispatch the parsed command. Returns the exit code (0 or 2).
async fn run_command(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let client = ApiClient::new(
        &config.service.base_url,
        config.service.timeout_seconds,
        !args.quiet,
    )?;
    let mut session = Session::new();

    match args.command.clone() {
        Command::List => {
            let registry = ModelRegistry::new(client.clone());
            let count = registry.refresh(&mut session).await?;

            if args.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(session.models())?);
                return Ok(0);
            }

            if count == 0 {
                println!("No models registered yet. Use `ethoscan add` to register one.");
                return Ok(0);
            }
            println!("📋 {} registered model(s):\n", count);
            for model in session.models() {
                println!("   #{} {} — {}", model.id, model.name, model.task);
                if !model.sensitive_features.is_empty() {
                    println!(
                        "      sensitive features: {}",
                        model.sensitive_features.join(", ")
                    );
                }
            }
            Ok(0)
        }

        Command::Add {
            name,
            description,
            dataset_summary,
            task,
            sensitive_features,
        } => {
            let registry = ModelRegistry::new(client.clone());
            let fields = ModelFields {
                name,
                description,
                dataset_summary,
                task,
                sensitive_features,
            };
            let model = registry.create(&mut session, fields).await?;

            if args.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&model)?);
            } else {
                println!("✅ Registered model #{} ({})", model.id, model.name);
            }
            Ok(0)
        }

        Command::Delete { id } => {
            let registry = ModelRegistry::new(client.clone());
            registry.refresh(&mut session).await?;
            registry.remove(&mut session, id).await?;
            println!("🗑️  Deleted model #{}", id);
            Ok(0)
        }

        Command::Predict { id, fail_on } => {
            let registry = ModelRegistry::new(client.clone());
            registry.refresh(&mut session).await?;

            println!("🔮 Running risk prediction for model #{}...", id);
            let orchestrator = Orchestrator::new(client.clone());
            orchestrator.run_predict(&mut session, id).await;

            let record = match take_risk_outcome(&session, id, RunKind::Predict) {
                Ok(record) => record,
                Err(message) => {
                    eprintln!("\n❌ Prediction failed: {}", message);
                    return Ok(1);
                }
            };

            let model = session
                .model(id)
                .cloned()
                .context("model vanished from the session snapshot")?;

            if args.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("\n{}", render::render_predict(&model, &record));
                if let Some(run_id) = session.run(id, RunKind::Predict).and_then(|r| r.run_id) {
                    println!("📄 Report available: ethoscan report {}", run_id);
                }
            }

            // CI gate on composite severity
            if let Some(threshold) = fail_on {
                let severity = record.composite_severity.unwrap_or(0);
                if severity >= threshold {
                    eprintln!(
                        "\n⛔ Severity {}/10 is at or above the --fail-on threshold {}. Failing (exit code 2).",
                        severity, threshold
                    );
                    return Ok(2);
                }
            }
            Ok(0)
        }

        Command::Redteam { id, .. } => {
            let attacks = config.redteam.attacks;
            println!(
                "⚔️  Running red-team probing for model #{} ({} attacks)...",
                id, attacks
            );
            let orchestrator = Orchestrator::new(client.clone());
            orchestrator.run_redteam(&mut session, id, attacks).await;

            let entry = session
                .run(id, RunKind::Redteam)
                .context("run entry missing after red-team")?;
            if entry.status == RunStatus::Error {
                eprintln!(
                    "\n❌ Red-team failed: {}",
                    entry.error.as_deref().unwrap_or("unknown error")
                );
                return Ok(1);
            }

            let Some(RunOutcome::Attacks(attacks)) = &entry.outcome else {
                anyhow::bail!("red-team run completed without an attack outcome");
            };

            if args.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(attacks)?);
            } else {
                println!("\n{}", render::render_attacks(attacks));
            }
            Ok(0)
        }

        Command::Audit { id } => {
            println!("🔬 Running ethics audit for model #{}...", id);
            let orchestrator = Orchestrator::new(client.clone());
            orchestrator.run_audit(&mut session, id).await;

            let record = match take_risk_outcome(&session, id, RunKind::Audit) {
                Ok(record) => record,
                Err(message) => {
                    eprintln!("\n❌ Audit failed: {}", message);
                    return Ok(1);
                }
            };

            if args.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("\n# Ethics Audit — model #{}\n", id);
                println!("{}", render::render_audit(&record));
            }
            Ok(0)
        }

        Command::Upload { file } => {
            if let Some(ref path) = file {
                println!("📤 Uploading {} for audit...", path.display());
            }
            let pipeline = UploadAuditPipeline::new(client.clone(), config.upload.max_file_size);
            let outcome = pipeline.submit(file.as_deref()).await?;

            if args.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("\n{}", render::render_upload(&outcome));
                if let Some(run_id) = outcome.run_id {
                    println!("📄 Report available: ethoscan report {}", run_id);
                }
            }
            Ok(0)
        }

        Command::Runs => {
            let runs = client.list_runs().await?;

            if args.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&runs)?);
            } else {
                println!("{}", render::render_runs(&runs));
            }
            Ok(0)
        }

        Command::Report { run_id, output } => {
            println!("📥 Downloading report for run #{}...", run_id);
            let bytes = client.export_report(run_id).await?;

            let path = output.unwrap_or_else(|| {
                PathBuf::from(&config.output.report_dir)
                    .join(format!("ethics_report_run_{}.pdf", run_id))
            });
            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;

            println!(
                "✅ Report saved to {} ({} bytes)",
                path.display(),
                bytes.len()
            );
            Ok(0)
        }

        Command::InitConfig => unreachable!("handled before dispatch"),
    }
}

/// Pull the canonical risk record out of a finished run entry, or the
/// stored error message for display.
fn take_risk_outcome(
    session: &Session,
    model_id: i64,
    kind: RunKind,
) -> std::result::Result<risk::CanonicalRiskRecord, String> {
    let Some(entry) = session.run(model_id, kind) else {
        return Err(format!("no {} run entry for model {}", kind, model_id));
    };
    if entry.status == RunStatus::Error {
        return Err(entry
            .error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string()));
    }
    match &entry.outcome {
        Some(RunOutcome::Risk(record)) => Ok(record.clone()),
        _ => Err(format!("{} run completed without a risk record", kind)),
    }
}
