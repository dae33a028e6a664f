use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lcphase_core::io::export::read_csv_file;
use lcphase_core::stats::summarize;

use crate::summary::print_statistics;

#[derive(Args)]
pub struct SummarizeArgs {
    /// CSV written by `lcphase analyze`
    pub csv: PathBuf,

    /// Also write statistics as TOML
    #[arg(long)]
    pub stats: Option<PathBuf>,
}

pub fn run(args: &SummarizeArgs) -> Result<()> {
    let rows = read_csv_file(&args.csv)
        .with_context(|| format!("Failed to read {}", args.csv.display()))?;
    let stats = summarize(&rows);
    print_statistics(&stats);

    if let Some(ref path) = args.stats {
        std::fs::write(path, stats.to_toml_string()?)
            .with_context(|| format!("Failed to write statistics to {}", path.display()))?;
        println!("Statistics saved to {}", path.display());
    }
    Ok(())
}
