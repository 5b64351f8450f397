use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use glyphdrift::catalog::render_catalog;
use glyphdrift::config::{load_and_validate_config, load_config, BackdropConfig};
use glyphdrift::sampler::{ImageSource, SourceFetcher};
use glyphdrift::scheduler::{run_backdrop, Backdrop, TerminalSink, Timing};

#[derive(Debug, Parser)]
#[command(name = "glyphdrift")]
#[command(about = "Rotating image-to-ASCII backdrop")]
#[command(version = env!("GLYPHDRIFT_LONG_VERSION"))]
struct Cli {
    /// Log debug events to stderr (RUST_LOG takes precedence).
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play the backdrop in this terminal until Ctrl-C.
    Run(RunArgs),
    /// Print one sampled grid and exit.
    Sample(SampleArgs),
    /// Validate a config file.
    Check { config: PathBuf },
    /// List the image catalog in rotation order.
    Sources(CatalogArgs),
}

#[derive(Debug, Args)]
struct CatalogArgs {
    /// Image URLs or paths; replaces the config's `images` when given.
    images: Vec<String>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    catalog: CatalogArgs,
    #[arg(long)]
    rows: Option<usize>,
    #[arg(long)]
    cols: Option<usize>,
    #[arg(long = "tick-ms")]
    tick_ms: Option<u64>,
    #[arg(long = "rotate-ms")]
    rotate_ms: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = false)]
    invert: bool,
    /// Stop after this many seconds instead of waiting for Ctrl-C.
    #[arg(long = "duration-secs")]
    duration_secs: Option<u64>,
}

#[derive(Debug, Args)]
struct SampleArgs {
    image: String,
    #[arg(long, default_value_t = glyphdrift::config::DEFAULT_ROWS)]
    rows: usize,
    #[arg(long, default_value_t = glyphdrift::config::DEFAULT_COLS)]
    cols: usize,
    #[arg(long, default_value_t = false)]
    invert: bool,
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct SampleOutput {
    rows: usize,
    cols: usize,
    lines: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run(args) => run_play(&args).await,
        Commands::Sample(args) => run_sample(&args).await,
        Commands::Check { config } => run_check(&config),
        Commands::Sources(args) => run_sources(&args),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn resolve_config(args: &CatalogArgs) -> Result<BackdropConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => BackdropConfig::default(),
    };
    if !args.images.is_empty() {
        config.images = args.images.clone();
        config.base_dir = None;
    }
    Ok(config)
}

fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("glyphdrift/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

/// Resolves on Ctrl-C. If the handler cannot be installed, logs and never
/// resolves, leaving any other shutdown condition in charge.
async fn wait_for_ctrl_c() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn run_play(args: &RunArgs) -> Result<()> {
    let mut config = resolve_config(&args.catalog)?;
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(cols) = args.cols {
        config.cols = cols;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if let Some(rotate_ms) = args.rotate_ms {
        config.rotation_interval_ms = rotate_ms;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.invert |= args.invert;

    let mut backdrop = Backdrop::from_config(&config).context("invalid backdrop configuration")?;
    let fetcher = SourceFetcher::new(http_client()?);
    let mut sink = TerminalSink::new(BufWriter::new(io::stdout()));

    let duration = args.duration_secs.map(Duration::from_secs);
    let shutdown = async move {
        match duration {
            Some(limit) => {
                tokio::select! {
                    _ = wait_for_ctrl_c() => {}
                    _ = tokio::time::sleep(limit) => {}
                }
            }
            None => {
                wait_for_ctrl_c().await;
            }
        }
    };

    let summary = run_backdrop(
        &mut backdrop,
        &fetcher,
        &mut sink,
        Timing::from_config(&config),
        shutdown,
    )
    .await?;
    info!(
        frames = summary.frames_published,
        samples = summary.samples_requested,
        failed = summary.samples_failed,
        transitions = summary.transitions_started,
        "backdrop stopped"
    );
    Ok(())
}

async fn run_sample(args: &SampleArgs) -> Result<()> {
    let config = BackdropConfig {
        rows: args.rows,
        cols: args.cols,
        invert: args.invert,
        images: vec![args.image.clone()],
        ..BackdropConfig::default()
    };
    config.validate()?;

    let source = ImageSource::parse(&args.image, None)?;
    let fetcher = SourceFetcher::new(http_client()?);
    let grid = config
        .sampler()
        .sample(&fetcher, &source)
        .await
        .with_context(|| format!("failed to sample {source}"))?;

    if args.json {
        let output = SampleOutput {
            rows: grid.rows(),
            cols: grid.cols(),
            lines: grid.lines().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{grid}");
    }
    Ok(())
}

fn run_check(config_path: &Path) -> Result<()> {
    let config = load_and_validate_config(config_path)
        .with_context(|| format!("{} is not a valid backdrop config", config_path.display()))?;

    println!(
        "OK: {} ({}x{} glyphs, tick {}ms, rotation {}ms, timeout {}ms)",
        config_path.display(),
        config.cols,
        config.rows,
        config.tick_interval_ms,
        config.rotation_interval_ms,
        config.load_timeout_ms
    );
    println!("Images: {}", config.images.len());
    Ok(())
}

fn run_sources(args: &CatalogArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let catalog = config.catalog()?;
    print!("{}", render_catalog(&catalog));
    Ok(())
}
