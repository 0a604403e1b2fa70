use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "exthost")]
#[command(about = "Runtime extension host with hot load, reload, and unload", long_about = None)]
struct Cli {
    /// Path to the config file (defaults to ~/.exthost/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the host: load extensions, apply directory changes periodically,
    /// serve the operator console
    Run {
        /// Watched extensions directory (overrides the config file)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Update interval like 30s, 5m, or 1h (overrides the config file)
        #[arg(short, long)]
        interval: Option<String>,
    },
    /// Load the extensions directory once and list what it contains
    Scan {
        /// Extensions directory (overrides the config file)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) | None => {
            println!("exthost {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Run { dir, interval }) => {
            cli::cmd_run(dir, interval, cli.config).await?;
        }
        Some(Commands::Scan { dir }) => {
            cli::cmd_scan(dir, cli.config)?;
        }
    }

    Ok(())
}
