use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use ai_client::{GatewayConfig, ModelGateway};
use clinigraph_extract::config::load_config;
use clinigraph_extract::schema::{to_document, validate};
use clinigraph_extract::{ExtractOptions, GraphExtractor};

#[derive(Parser)]
#[command(
    name = "clinigraph",
    about = "Extract clinical argument knowledge graphs with an LLM"
)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a graph from a text file (`-` reads stdin)
    Extract(ExtractArgs),
    /// Check a saved graph document against the schema
    Validate {
        path: PathBuf,
    },
}

#[derive(Args)]
struct ExtractArgs {
    #[arg(long)]
    input: PathBuf,

    /// Visit transcript for risk coverage. Defaults to the input text.
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Path to config TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    temperature: Option<f32>,
    #[arg(long)]
    max_output_tokens: Option<u32>,

    /// Skip the risk coverage pass
    #[arg(long)]
    no_risk: bool,
    #[arg(long)]
    risk_model: Option<String>,
    #[arg(long)]
    risk_temperature: Option<f32>,
    #[arg(long)]
    risk_max_output_tokens: Option<u32>,

    #[arg(long)]
    base_dir: Option<PathBuf>,
    /// Output path, relative to the base directory unless absolute
    #[arg(long)]
    output: Option<PathBuf>,
    /// Do not write the document to disk
    #[arg(long)]
    no_write: bool,
    /// Print the full document instead of stats
    #[arg(long)]
    print: bool,
}

impl ExtractArgs {
    fn apply(&self, options: &mut ExtractOptions) {
        if let Some(ref model) = self.model {
            options.model = model.clone();
        }
        if self.temperature.is_some() {
            options.temperature = self.temperature;
        }
        if self.max_output_tokens.is_some() {
            options.max_output_tokens = self.max_output_tokens;
        }
        if self.no_risk {
            options.project_risk_coverage = false;
        }
        if let Some(ref model) = self.risk_model {
            options.risk.model = Some(model.clone());
        }
        if self.risk_temperature.is_some() {
            options.risk.temperature = self.risk_temperature;
        }
        if self.risk_max_output_tokens.is_some() {
            options.risk.max_output_tokens = self.risk_max_output_tokens;
        }
        if let Some(ref dir) = self.base_dir {
            options.output.base_dir = dir.clone();
        }
        if let Some(ref path) = self.output {
            options.output.path = Some(path.clone());
        }
        if self.no_write {
            options.output.write_file = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Command::Extract(args) => run_extract(args).await,
        Command::Validate { path } => run_validate(&path),
    }
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    let source = read_input(&args.input)?;
    if source.trim().is_empty() {
        bail!("Input is empty: {}", args.input.display());
    }
    let transcript = match args.transcript {
        Some(ref path) => read_input(path)?,
        None => source.clone(),
    };

    let mut options = ExtractOptions::default();
    if let Some(ref path) = args.config {
        tracing::info!(config = %path.display(), "Loading config");
        load_config(path)?.apply(&mut options);
    }
    args.apply(&mut options);

    let gateway = ModelGateway::new(&GatewayConfig::from_env()?);
    let extractor = GraphExtractor::new(Arc::new(gateway), options);

    tracing::info!(model = %extractor.options().model, "Starting extraction");
    let extraction = extractor
        .extract_with_transcript(&source, &transcript)
        .await?;

    let out = if args.print {
        serde_json::to_value(&extraction.document)?
    } else {
        json!({
            "stats": extraction.stats,
            "written_to": extraction.written_to,
        })
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_validate(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph file: {}", path.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse graph file: {}", path.display()))?;
    let document = to_document(&validate(raw)?)?;

    println!("{}", serde_json::to_string_pretty(&document.stats())?);
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))
}
