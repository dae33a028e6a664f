use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lcphase_core::analysis::analyze_frame_with_binary;
use lcphase_core::detection::build_mask;
use lcphase_core::io::image_io::{load_mask_png, save_binary_png};

use crate::summary::print_measurement;

#[derive(Args)]
pub struct InspectArgs {
    /// Input SER file or directory of images
    pub input: PathBuf,

    /// Frame to analyze
    #[arg(long)]
    pub frame: usize,

    /// Frame the electrode mask is built from
    #[arg(long, default_value = "0")]
    pub mask_frame: usize,

    /// Use a mask PNG written by `lcphase mask` instead of building one
    #[arg(long, conflicts_with = "mask_frame")]
    pub mask: Option<PathBuf>,

    /// Analysis config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Save the binarized image as PNG
    #[arg(long)]
    pub binary: Option<PathBuf>,
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    config.validate().context("Invalid configuration")?;
    let fps = config.source.fps;

    let frame = super::load_source_frame(&args.input, args.frame, fps)?;
    let mask = match args.mask {
        Some(ref path) => load_mask_png(path)
            .with_context(|| format!("Failed to load mask {}", path.display()))?,
        None if args.mask_frame == args.frame => build_mask(&frame, &config.mask)?,
        None => {
            let reference = super::load_source_frame(&args.input, args.mask_frame, fps)?;
            build_mask(&reference, &config.mask)?
        }
    };

    let (measurement, binary) = analyze_frame_with_binary(&frame, &mask, &config)
        .with_context(|| format!("Failed to analyze frame {}", args.frame))?;
    print_measurement(frame.index, frame.timestamp_seconds, &measurement);

    if let Some(ref path) = args.binary {
        save_binary_png(&binary, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Binarized image saved to {}", path.display());
    }
    Ok(())
}
