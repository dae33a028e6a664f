use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lcphase_core::detection::build_electrode_mask;
use lcphase_core::io::image_io::save_mask_png;

#[derive(Args)]
pub struct MaskArgs {
    /// Input SER file or directory of images
    pub input: PathBuf,

    /// Reference frame index
    #[arg(long, default_value = "0")]
    pub frame: usize,

    /// Analysis config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output PNG (white = liquid crystal)
    #[arg(short, long, default_value = "mask.png")]
    pub output: PathBuf,
}

pub fn run(args: &MaskArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    config.validate().context("Invalid configuration")?;

    let frame = super::load_source_frame(&args.input, args.frame, config.source.fps)?;
    let electrode = build_electrode_mask(&frame, &config.mask)?;
    let mask = &electrode.mask;

    println!("Reference frame:  {}", args.frame);
    println!("Dimensions:       {}x{}", mask.width(), mask.height());
    println!("Regions:          {}", electrode.regions.len());
    for (i, region) in electrode.regions.iter().enumerate() {
        let (min_row, max_row, min_col, max_col) = region.bbox;
        println!(
            "  [{}] area {} px, rows {}..={}, cols {}..={}",
            i + 1,
            region.area,
            min_row,
            max_row,
            min_col,
            max_col
        );
    }
    let total = mask.width() * mask.height();
    println!(
        "Excluded pixels:  {} ({:.1}%)",
        mask.excluded_pixel_count(),
        mask.excluded_pixel_count() as f64 / total as f64 * 100.0
    );

    save_mask_png(mask, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Mask saved to {}", args.output.display());
    Ok(())
}
