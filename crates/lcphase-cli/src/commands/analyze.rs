use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use lcphase_core::analysis::TextureMethod;
use lcphase_core::io::export::write_csv_file;
use lcphase_core::io::image_io::save_mask_png;
use lcphase_core::io::source::sampled_len;
use lcphase_core::io::{open_source, PrefetchSource};
use lcphase_core::pipeline::{AnalysisConfig, AnalysisController, SessionEvent, SessionState};

use crate::summary::{print_analysis_header, print_session_result, print_statistics};

#[derive(Clone, Copy, ValueEnum)]
pub enum TextureMethodArg {
    Contours,
    EdgeDensity,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input SER file or directory of images
    pub input: PathBuf,

    /// Analysis config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Frames with fewer valid contours are ISOTROPIC
    #[arg(long)]
    pub contour_threshold: Option<u32>,

    /// Frames with intensity variance at or above this are ISOTROPIC
    #[arg(long)]
    pub variance_threshold: Option<f64>,

    /// Analyze every Nth frame
    #[arg(long)]
    pub stride: Option<u32>,

    /// Frame rate assumed when the source has no timestamps
    #[arg(long)]
    pub fps: Option<f64>,

    /// Structure measurement used for the contour label
    #[arg(long, value_enum)]
    pub method: Option<TextureMethodArg>,

    /// Output CSV path
    #[arg(short, long, default_value = "phase_results.csv")]
    pub output: PathBuf,

    /// Also write statistics as TOML
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Also save the electrode mask as PNG
    #[arg(long)]
    pub save_mask: Option<PathBuf>,
}

fn build_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(t) = args.contour_threshold {
        config.thresholds.contour_threshold = t;
    }
    if let Some(t) = args.variance_threshold {
        config.thresholds.variance_threshold = t;
    }
    if let Some(stride) = args.stride {
        config.thresholds.sampling_stride = stride;
    }
    if let Some(fps) = args.fps {
        config.source.fps = fps;
    }
    if let Some(method) = args.method {
        config.texture.method = match method {
            TextureMethodArg::Contours => TextureMethod::Contours,
            TextureMethodArg::EdgeDensity => TextureMethod::EdgeDensity,
        };
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let config = build_config(args)?;
    let stride = config.thresholds.sampling_stride as usize;

    let (source, info) = open_source(&args.input, stride, config.source.fps)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    print_analysis_header(&config, &info, &args.output);

    let source = PrefetchSource::spawn(source)?;
    let mut controller = AnalysisController::new(config);
    controller.start(source)?;

    let pb = ProgressBar::new(sampled_len(info.total_frames, stride) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}/{len} ({eta})")?
            .progress_chars("=> "),
    );

    loop {
        match controller.recv_timeout(Duration::from_millis(100)) {
            Some(SessionEvent::Progress {
                frame_index,
                estimated_total,
                result,
            }) => {
                if let Some(total) = estimated_total {
                    pb.set_length(total as u64);
                }
                pb.inc(1);
                pb.set_message(format!("frame {frame_index}: {}", result.phase_by_contour));
            }
            Some(SessionEvent::Finished { .. }) => break,
            None if controller.worker_finished() => break,
            None => {}
        }
    }

    let state = controller.wait()?;
    pb.finish_and_clear();

    let session = controller
        .session()
        .context("Analysis session was not returned by the worker")?;
    let results = session.results();

    print_session_result(
        &state,
        results.len(),
        results.error_count(),
        session.mask().map(|m| m.lc_pixel_count()),
    );

    if results.is_empty() {
        if let SessionState::Failed(reason) = &state {
            bail!("Analysis failed: {reason}");
        }
        println!("\nNo frames analyzed; nothing written.");
        return Ok(());
    }

    write_csv_file(&args.output, results.as_slice())
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let stats = session.statistics();
    print_statistics(&stats);

    if let Some(ref path) = args.stats {
        std::fs::write(path, stats.to_toml_string()?)
            .with_context(|| format!("Failed to write statistics to {}", path.display()))?;
        println!("Statistics saved to {}", path.display());
    }
    if let (Some(path), Some(mask)) = (&args.save_mask, session.mask()) {
        save_mask_png(mask, path)
            .with_context(|| format!("Failed to write mask to {}", path.display()))?;
        println!("Mask saved to {}", path.display());
    }

    println!("Results saved to {}", args.output.display());

    if let SessionState::Failed(reason) = &state {
        bail!("Analysis failed after {} frames: {reason}", results.len());
    }
    Ok(())
}
