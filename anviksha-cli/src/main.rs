//! Anviksha CLI Entry Point
//!
//! Reads chest X-ray images, runs them through the analysis pipeline and
//! prints the report or the classified failure.
//!
//! Exit codes: 0 when every image was analyzed, 1 when any image failed,
//! 2 on usage or configuration errors.

mod input;
mod render;

use anviksha_core::AnalysisRequest;
use anviksha_llm::schema::{provider_response_schema, validation_schema};
use anviksha_llm::{AnvikshaConfig, CredentialStore, ExhaustionPolicy, ProviderKind};
use anviksha_utils::logging::{init_logging, LogLevel, LoggerConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "anviksha")]
#[command(about = "Anviksha - AI-assisted chest X-ray analysis with tuberculosis screening")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more chest X-ray images (JPEG or PNG)
    Analyze {
        /// Image files to analyze, in order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Gemini API key
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Use the built-in demo provider instead of the Gemini API
        #[arg(long)]
        mock: bool,

        /// Model to try, in order (repeatable; overrides the configured list)
        #[arg(short = 'm', long = "model")]
        models: Vec<String>,

        /// Print JSON instead of a human-readable report
        #[arg(long)]
        json: bool,

        /// Return a placeholder report instead of an error when every model fails
        #[arg(long)]
        placeholder_on_failure: bool,

        /// Configuration file path (TOML, JSON or YAML)
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Enable debug logging
        #[arg(short = 'd', long)]
        debug: bool,
    },

    /// Print the structured-output schema sent to the model
    Schema {
        /// Print the JSON Schema replies are validated against instead
        #[arg(long)]
        validation: bool,
    },
}

struct AnalyzeArgs {
    images: Vec<PathBuf>,
    api_key: Option<String>,
    mock: bool,
    models: Vec<String>,
    json: bool,
    placeholder_on_failure: bool,
    config: Option<PathBuf>,
    debug: bool,
}

fn load_config(args: &AnalyzeArgs) -> Result<AnvikshaConfig> {
    let config = AnvikshaConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let config = apply_overrides(config, args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Command-line flags take precedence over file and environment settings
fn apply_overrides(mut config: AnvikshaConfig, args: &AnalyzeArgs) -> AnvikshaConfig {
    if args.mock {
        config.provider = ProviderKind::Mock;
    }
    if !args.models.is_empty() {
        config.pipeline.models.clone_from(&args.models);
    }
    if args.placeholder_on_failure {
        config.pipeline.on_exhausted = ExhaustionPolicy::Placeholder;
    }
    config
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn analyze(args: AnalyzeArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;

    let level = if args.debug { LogLevel::Debug } else { config.logging.level };
    init_logging(LoggerConfig {
        level,
        ..Default::default()
    })?;

    let pipeline = config.build_pipeline().context("Failed to initialize analysis pipeline")?;
    info!(provider = pipeline.provider_name(), models = ?pipeline.config().models, "Pipeline ready");

    let mut credentials = CredentialStore::new();
    if let Some(key) = args.api_key {
        credentials.set(key);
    }

    let mut all_succeeded = true;
    for path in &args.images {
        let outcome = match input::load_image(path) {
            Ok(image) => {
                let mut request = AnalysisRequest::new(image);
                if let Some(credential) = credentials.current() {
                    request = request.with_credential(credential.clone());
                }
                pipeline.analyze_detailed(&request).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(report) => {
                if args.json {
                    print_json(&render::report_json(path, &report))?;
                } else {
                    println!("{}", render::report_text(path, &report));
                }
            }
            Err(error) => {
                all_succeeded = false;
                if credentials.invalidate_if_auth_failure(&error) {
                    eprintln!("The API key was rejected and has been cleared for this session.");
                }
                if args.json {
                    print_json(&render::failure_json(path, &error))?;
                } else {
                    eprintln!("{}", render::failure_text(path, &error));
                }
            }
        }
    }

    Ok(if all_succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_schema(validation: bool) -> Result<ExitCode> {
    let schema = if validation {
        validation_schema()
    } else {
        provider_response_schema()
    };
    print_json(&schema)?;
    Ok(ExitCode::SUCCESS)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Analyze {
            images,
            api_key,
            mock,
            models,
            json,
            placeholder_on_failure,
            config,
            debug,
        } => {
            analyze(AnalyzeArgs {
                images,
                api_key,
                mock,
                models,
                json,
                placeholder_on_failure,
                config,
                debug,
            })
            .await
        }
        Commands::Schema { validation } => print_schema(validation),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let args = AnalyzeArgs {
            images: vec![PathBuf::from("x.png")],
            api_key: None,
            mock: true,
            models: vec!["only-model".to_string()],
            json: false,
            placeholder_on_failure: true,
            config: None,
            debug: false,
        };
        let config = apply_overrides(AnvikshaConfig::default(), &args);
        assert_eq!(config.provider, ProviderKind::Mock);
        assert_eq!(config.pipeline.models, vec!["only-model"]);
        assert_eq!(config.pipeline.on_exhausted, ExhaustionPolicy::Placeholder);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let args = AnalyzeArgs {
            images: vec![PathBuf::from("x.png")],
            api_key: None,
            mock: false,
            models: Vec::new(),
            json: false,
            placeholder_on_failure: false,
            config: None,
            debug: false,
        };
        let config = apply_overrides(AnvikshaConfig::default(), &args);
        assert_eq!(config, AnvikshaConfig::default());
    }
}
