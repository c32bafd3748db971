//! subjet CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod process;

#[derive(Parser)]
#[command(name = "subjet")]
#[command(about = "subjet - jet substructure arrays for heavy-ion ML studies")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a particle table into per-key jet arrays and QA artifacts
    Process {
        /// Analysis configuration (YAML, or JSON by extension)
        #[arg(short, long)]
        config: PathBuf,

        /// Input particle table (Parquet); its path decides the class label
        #[arg(short = 'f', long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Stop after this many events (overrides the configuration)
        #[arg(long)]
        max_events: Option<usize>,

        /// Random seed (overrides the configuration)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Process { config, input, output_dir, max_events, seed } => {
            process::cmd_process(&config, &input, &output_dir, max_events, seed)
        }
        Commands::Version => {
            println!("subjet {}", sj_core::VERSION);
            Ok(())
        }
    }
}
