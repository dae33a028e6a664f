use std::path::Path;

use console::Style;
use lcphase_core::analysis::{FrameMeasurement, Phase};
use lcphase_core::io::SourceInfo;
use lcphase_core::pipeline::{AnalysisConfig, SessionState};
use lcphase_core::stats::Statistics;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    cholesteric: Style,
    isotropic: Style,
    error: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            cholesteric: Style::new().magenta().bold(),
            isotropic: Style::new().blue().bold(),
            error: Style::new().red().bold(),
        }
    }

    fn phase(&self, phase: Phase) -> console::StyledObject<&'static str> {
        let style = match phase {
            Phase::Cholesteric => &self.cholesteric,
            Phase::Isotropic => &self.isotropic,
            Phase::Error => &self.error,
        };
        style.apply_to(phase.label())
    }
}

fn rule(len: usize) -> String {
    "\u{2550}".repeat(len)
}

pub fn print_analysis_header(config: &AnalysisConfig, info: &SourceInfo, output: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("LC Phase Analysis"));
    println!("  {}", s.title.apply_to(rule(17)));
    println!();

    println!("  {:<14}{}", s.label.apply_to("Input"), s.path.apply_to(&info.description));
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(output.display()));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(format!(
            "{} ({}x{}), every {}",
            info.total_frames, info.width, info.height, config.thresholds.sampling_stride
        ))
    );
    let timing = if info.has_timestamps {
        "SER timestamps".to_string()
    } else {
        format!("{} fps", info.fps)
    };
    println!("  {:<14}{}", s.label.apply_to("Timing"), s.value.apply_to(timing));

    println!();
    println!("  {}", s.header.apply_to("Classification"));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Texture"),
        s.method.apply_to(&config.texture.method)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Contours"),
        s.value.apply_to(format!("< {} => ISOTROPIC", config.thresholds.contour_threshold))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Variance"),
        s.value.apply_to(format!(">= {} => ISOTROPIC", config.thresholds.variance_threshold))
    );

    println!();
    println!("  {}", s.header.apply_to("Preprocessing"));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Equalize"),
        s.method.apply_to(&config.preprocess.equalization)
    );
    match &config.preprocess.denoise {
        Some(d) => println!(
            "  {:<14}{}",
            s.label.apply_to("Denoise"),
            s.method.apply_to(format!("non-local means (h={})", d.strength))
        ),
        None => println!("  {:<14}{}", s.label.apply_to("Denoise"), s.disabled.apply_to("disabled")),
    }
    println!();
}

pub fn print_session_result(state: &SessionState, frames: usize, errors: usize, lc_pixels: Option<usize>) {
    let s = Styles::new();

    let state_style = match state {
        SessionState::Completed => &s.method,
        SessionState::Cancelled => &s.disabled,
        _ => &s.error,
    };
    println!("  {:<14}{}", s.label.apply_to("Session"), state_style.apply_to(state));
    println!("  {:<14}{}", s.label.apply_to("Analyzed"), s.value.apply_to(frames));
    if errors > 0 {
        println!("  {:<14}{}", s.label.apply_to("ERROR rows"), s.error.apply_to(errors));
    }
    if let Some(px) = lc_pixels {
        println!("  {:<14}{}", s.label.apply_to("LC pixels"), s.value.apply_to(px));
    }
}

pub fn print_statistics(stats: &Statistics) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Statistics"));
    println!("  {}", s.title.apply_to(rule(10)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(format!(
            "{} ({} error)",
            stats.total_frames, stats.error_frames
        ))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Duration"),
        s.value.apply_to(format!("{:.2} min", stats.total_duration_minutes))
    );

    println!();
    println!("  {}", s.header.apply_to("By contours"));
    println!(
        "  {:<14}{:>6.1}%  {:.2} min",
        s.phase(Phase::Cholesteric),
        stats.cholesteric_percent(),
        stats.cholesteric_duration_minutes
    );
    println!(
        "  {:<14}{:>6.1}%  {:.2} min",
        s.phase(Phase::Isotropic),
        stats.isotropic_percent(),
        stats.isotropic_duration_minutes
    );
    match stats.first_transition_minute {
        Some(minute) => println!(
            "  {:<14}{}",
            s.label.apply_to("Transition"),
            s.value.apply_to(format!("{minute:.2} min"))
        ),
        None => println!("  {:<14}{}", s.label.apply_to("Transition"), s.disabled.apply_to("none")),
    }

    println!();
    println!("  {}", s.header.apply_to("By variance"));
    println!(
        "  {:<14}{:>6.1}%",
        s.phase(Phase::Cholesteric),
        stats.variance_cholesteric_fraction * 100.0
    );
    println!(
        "  {:<14}{:>6.1}%",
        s.phase(Phase::Isotropic),
        stats.variance_isotropic_fraction * 100.0
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Agreement"),
        s.value.apply_to(format!("{:.1}%", stats.agreement_fraction * 100.0))
    );
    println!();
}

pub fn print_measurement(frame_index: usize, timestamp_seconds: f64, m: &FrameMeasurement) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to(format!("Frame {frame_index}")));
    println!("  {}", s.title.apply_to(rule(16)));
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Time"),
        s.value.apply_to(format!("{:.3} s ({:.3} min)", timestamp_seconds, timestamp_seconds / 60.0))
    );
    println!("  {:<14}{}", s.label.apply_to("Contours"), s.value.apply_to(m.num_contours));
    if let Some(t) = m.texture {
        println!("  {:<14}{}", s.label.apply_to("Edges"), s.value.apply_to(t.edge_count));
    }
    println!("  {:<14}{}", s.label.apply_to("LC pixels"), s.value.apply_to(m.intensity.pixel_count));
    println!("  {:<14}{}", s.label.apply_to("Mean"), s.value.apply_to(format!("{:.3}", m.intensity.mean)));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Variance"),
        s.value.apply_to(format!("{:.3}", m.intensity.variance))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Std dev"),
        s.value.apply_to(format!("{:.3}", m.intensity.std_dev))
    );
    println!();
    println!("  {:<14}{}", s.label.apply_to("By contours"), s.phase(m.classification.by_contour));
    println!("  {:<14}{}", s.label.apply_to("By variance"), s.phase(m.classification.by_variance));
    println!();
}
