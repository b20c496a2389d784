//! CLI command definitions for cert-forge.
//!
//! `serve` runs the HTTP service; `analyze` runs a single analysis on a
//! local image and prints the normalized JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::config::{ModelConfig, ServerConfig, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_MB, DEFAULT_PORT};
use crate::error::ConfigError;
use crate::forensics::ForensicsService;
use crate::llm::providers::gemini::{DEFAULT_MODEL, GEMINI_BASE_URL};
use crate::llm::GeminiProvider;
use crate::server;
use crate::utils::json_extraction::ResponseShape;

/// Certificate forgery analysis backed by a vision model.
#[derive(Parser)]
#[command(name = "cert-forge")]
#[command(about = "Detect forged certificates and extract their fields with a vision model")]
#[command(version)]
#[command(
    long_about = "cert-forge relays uploaded certificate images to Google Gemini and returns its verdict as JSON.\n\nExample usage:\n  GEMINI_API_KEY=... cert-forge serve --port 8000\n  cert-forge analyze ./certificate.png --mode extract --pretty"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the HTTP service (`POST /predict`, `POST /extract`).
    Serve(ServeArgs),

    /// Analyze a local certificate image and print the result.
    Analyze(AnalyzeArgs),
}

/// Vision model connection flags shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct ModelArgs {
    /// Gemini API key (required; can also be set via GEMINI_API_KEY).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini REST API base URL.
    #[arg(long, env = "GEMINI_API_BASE", default_value = GEMINI_BASE_URL)]
    pub api_base: String,

    /// Gemini model to use.
    #[arg(short = 'm', long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
}

impl ModelArgs {
    /// Validates the flags into a model configuration.
    pub fn into_config(self) -> Result<ModelConfig, ConfigError> {
        ModelConfig::from_parts(self.api_key, self.api_base, self.model)
    }
}

/// Arguments for `cert-forge serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Address to listen on.
    #[arg(long, env = "CERT_FORGE_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on.
    #[arg(short = 'p', long, env = "CERT_FORGE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Largest accepted upload, in MiB.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,
}

impl ServeArgs {
    /// Validates the flags into a server configuration.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let config = ServerConfig::new(self.model.into_config()?)
            .with_host(self.host)
            .with_port(self.port)
            .with_max_upload_mb(self.max_upload_mb);
        config.validate()?;
        Ok(config)
    }
}

/// Which analysis `analyze` runs.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Forgery detection with suspicious-region boxes.
    Detect,
    /// Certificate field extraction.
    Extract,
}

impl From<AnalysisMode> for ResponseShape {
    fn from(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Detect => ResponseShape::Detection,
            AnalysisMode::Extract => ResponseShape::Extraction,
        }
    }
}

/// Arguments for `cert-forge analyze`.
#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Path to the certificate image.
    pub path: PathBuf,

    /// Analysis to run.
    #[arg(long, value_enum, default_value = "detect")]
    pub mode: AnalysisMode,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Parse CLI arguments without executing.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run an already-parsed command line.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Analyze(args) => run_analyze(args).await,
    }
}

fn build_service(config: &ModelConfig) -> ForensicsService {
    let provider = GeminiProvider::with_custom_url(
        config.api_key.clone(),
        config.api_base.clone(),
        config.model.clone(),
    );
    info!(
        model = %config.model,
        api_base = %provider.base_url(),
        api_key = %provider.api_key_masked(),
        "Configured Gemini provider"
    );
    ForensicsService::new(Arc::new(provider), config.model.clone())
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;
    let service = build_service(&config.model);
    server::run(config, service).await
}

async fn run_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = args.model.into_config()?;
    let image = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("Failed to read image {}", args.path.display()))?;

    let service = build_service(&config);
    let result = service.analyze(&image, args.mode.into()).await?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", output);
    Ok(())
}
