use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinescroll_core::Options;

mod commands;

#[derive(Parser)]
#[command(name = "cinescroll")]
#[command(author, version, about = "Smooth-scroll and scroll-trigger orchestration, headless")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Options file (defaults to ~/.config/cinescroll/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Pretend the platform prefers reduced motion
    #[arg(long, global = true)]
    reduced_motion: bool,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, global = true, default_value = "1280x800", value_parser = commands::parse_size)]
    viewport: (f64, f64),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    Toml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the configuration the options resolve to
    Resolve {
        #[arg(short = 'f', long, value_enum, default_value = "toml")]
        format: Format,
    },
    /// List the easing registry
    Easings {
        /// Print sampled curve values
        #[arg(short = 's', long)]
        samples: Option<usize>,
    },
    /// Run a headless page through initialize, scrolling and destroy
    Simulate {
        /// Total wheel distance in pixels
        #[arg(long, default_value_t = 1600.0)]
        scroll: f64,
        /// Simulated frames after the wheel input
        #[arg(long, default_value_t = 180)]
        frames: u32,
        /// Print trigger state every N frames
        #[arg(long, default_value_t = 30)]
        every: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let options = match &cli.config {
        Some(path) => Options::load_from(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => Options::load().context("Failed to load options")?,
    };
    let page = commands::PageSetup {
        viewport: cli.viewport,
        reduced_motion: cli.reduced_motion,
    };

    match cli.command {
        Commands::Resolve { format } => commands::resolve::run(&options, &page, format),
        Commands::Easings { samples } => commands::easings::run(samples),
        Commands::Simulate {
            scroll,
            frames,
            every,
        } => commands::simulate::run(options, &page, scroll, frames, every).await,
    }
}
