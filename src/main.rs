//! fxchain CLI - Offline Audio Effect Renderer
//!
//! Command-line interface for the fxchain effect chain.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use fxchain::cli::{commands, Cli, Commands};
use fxchain::{AudioProcessor, ProcessorConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("fxchain v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => ProcessorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ProcessorConfig::default(),
    }
    .with_env_overrides()
    .context("applying environment overrides")?;
    debug!(?config, "configuration loaded");

    let processor = AudioProcessor::new(config).context("creating processor")?;

    match cli.command {
        Commands::Process(args) => commands::process(&processor, &args)
            .with_context(|| format!("processing {}", args.source.display()))?,
        Commands::SampleRate { path } => commands::sample_rate(&processor, &path)
            .with_context(|| format!("reading {}", path.display()))?,
        Commands::Play { path, seconds } => commands::play(&processor, &path, seconds)
            .with_context(|| format!("playing {}", path.display()))?,
    }

    Ok(())
}
