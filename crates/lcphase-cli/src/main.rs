mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lcphase", about = "Liquid-crystal phase classification from microscopy video")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show SER/image sequence metadata
    Info(commands::info::InfoArgs),
    /// Classify every sampled frame and export the time series
    Analyze(commands::analyze::AnalyzeArgs),
    /// Build the electrode mask from a reference frame
    Mask(commands::mask::MaskArgs),
    /// Run the per-frame pipeline on a single frame
    Inspect(commands::inspect::InspectArgs),
    /// Print statistics for an exported CSV
    Summarize(commands::summarize::SummarizeArgs),
    /// Print or save the default configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Mask(args) => commands::mask::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Summarize(args) => commands::summarize::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
