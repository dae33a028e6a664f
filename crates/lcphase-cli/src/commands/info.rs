use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lcphase_core::consts::DEFAULT_FPS;
use lcphase_core::io::image_seq::ImageSequenceSource;
use lcphase_core::io::ser::SerReader;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file or directory of images
    pub input: PathBuf,

    /// Frame rate assumed when the source has no timestamps
    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: f64,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    if args.input.is_dir() {
        let source = ImageSequenceSource::open(&args.input, 1, args.fps)?;
        let info = source.source_info(&args.input)?;
        println!("Source:      {}", info.description);
        println!("Frames:      {}", info.total_frames);
        println!("Dimensions:  {}x{}", info.width, info.height);
        println!("Frame rate:  {} fps (assumed)", info.fps);
        println!(
            "Duration:    {:.2} min",
            info.total_frames as f64 / info.fps / 60.0
        );
        return Ok(());
    }

    let reader = SerReader::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let info = reader.source_info(&args.input, args.fps);
    let header = &reader.header;

    println!("Source:      {}", info.description);
    println!("Frames:      {}", info.total_frames);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Bit depth:   {}", header.pixel_depth);
    println!("Color mode:  {}", header.color_name());

    if !header.observer.is_empty() {
        println!("Observer:    {}", header.observer);
    }
    if !header.instrument.is_empty() {
        println!("Instrument:  {}", header.instrument);
    }
    if !header.telescope.is_empty() {
        println!("Telescope:   {}", header.telescope);
    }

    if info.has_timestamps && info.total_frames > 0 {
        let last = reader.timestamp_seconds(info.total_frames - 1, args.fps);
        println!("Timestamps:  yes ({:.2} min span)", last / 60.0);
    } else {
        println!("Timestamps:  no (using {} fps)", info.fps);
    }

    let frame_bytes = header.frame_byte_size().unwrap_or(0);
    let total_mb = (frame_bytes * info.total_frames) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}
