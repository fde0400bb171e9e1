mod display;
mod serve;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use veritas_core::{AnalyzerMode, CaseInput, TribunalConfig};
use veritas_host::{Bookkeeper, StoreBookkeeper, Tribunal};
use veritas_store::manifest::{DEFAULT_MANIFEST_PATH, FAILURE_EXIT_CODE};
use veritas_store::{OutputStore, StoreError, verify_manifest};

use display::Format;

#[derive(Parser)]
#[command(
    name = "veritas",
    version,
    about = "Veritas tribunal: restorative case analysis and verdict synthesis"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one case and print the verdict record
    Run(RunArgs),
    /// Serve the pipeline over HTTP
    Serve(ServeArgs),
    /// Check boot manifest file hashes
    VerifyManifest(ManifestArgs),
}

#[derive(Args)]
struct PipelineArgs {
    /// Analyzer backend: auto, remote or local
    #[arg(long)]
    analyzer_mode: Option<AnalyzerMode>,

    /// Attach per-analyzer diagnostics to each record
    #[arg(long)]
    diagnostics: bool,

    /// Record usage and outputs under this directory
    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    /// Case input JSON file (stdin when neither --input nor --narrative is given)
    #[arg(long, conflicts_with = "narrative")]
    input: Option<PathBuf>,

    #[arg(long)]
    narrative: Option<String>,

    #[arg(long)]
    jurisdiction: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Args)]
struct ManifestArgs {
    #[arg(long, default_value = DEFAULT_MANIFEST_PATH)]
    manifest: PathBuf,

    /// Directory entry paths resolve against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Treat entries without an expected hash as failures
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("veritas v{}", env!("CARGO_PKG_VERSION"));

    let code = match Cli::parse().command {
        Command::Run(args) => run_case(args).await?,
        Command::Serve(args) => {
            let state = serve::AppState {
                tribunal: Tribunal::from_config(build_config(&args.pipeline)?),
                bookkeeper: open_bookkeeper(args.pipeline.store.as_deref())?
                    .map(|k| Arc::new(k) as Arc<dyn Bookkeeper>),
            };
            serve::serve(&args.host, args.port, state).await?;
            0
        }
        Command::VerifyManifest(args) => verify(&args),
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn build_config(args: &PipelineArgs) -> anyhow::Result<Arc<TribunalConfig>> {
    let mut config = TribunalConfig::from_env().context("reading configuration from environment")?;
    if let Some(mode) = args.analyzer_mode {
        config.analyzer_mode = mode;
    }
    if args.diagnostics {
        config.include_diagnostics = true;
    }
    Ok(Arc::new(config))
}

fn open_bookkeeper(dir: Option<&Path>) -> anyhow::Result<Option<StoreBookkeeper>> {
    dir.map(|d| {
        OutputStore::open(d)
            .map(StoreBookkeeper::new)
            .with_context(|| format!("opening output store at {}", d.display()))
    })
    .transpose()
}

async fn run_case(args: RunArgs) -> anyhow::Result<i32> {
    let mut input = read_input(&args)?;
    if let Some(j) = args.jurisdiction {
        input.jurisdiction = Some(j);
    }
    if let Some(m) = args.model {
        input.model_name = Some(m);
    }

    let tribunal = Tribunal::from_config(build_config(&args.pipeline)?);
    let result = match open_bookkeeper(args.pipeline.store.as_deref())? {
        Some(keeper) => tribunal.process_and_record(input, &keeper).await,
        None => tribunal.process_case(input).await,
    };

    match result {
        Ok(record) => {
            display::print_record(&record, args.format)?;
            Ok(0)
        }
        Err(e) if e.is_validation() => {
            eprintln!("{e}");
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}

fn read_input(args: &RunArgs) -> anyhow::Result<CaseInput> {
    if let Some(text) = &args.narrative {
        return Ok(CaseInput::from_narrative(text.clone()));
    }
    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading case input from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("parsing case input JSON")
}

fn verify(args: &ManifestArgs) -> i32 {
    match verify_manifest(&args.manifest, &args.root, args.strict) {
        Ok(report) => {
            println!("{report}");
            report.exit_code()
        }
        Err(StoreError::ManifestNotFound(path)) => {
            println!("Manifest not found: {}", path.display());
            FAILURE_EXIT_CODE
        }
        Err(e) => {
            eprintln!("{e}");
            FAILURE_EXIT_CODE
        }
    }
}
