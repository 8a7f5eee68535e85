//! `occlusion-detect` – annotate a CSV of lidar scans with occlusion verdicts.
//!
//! Each input row holds one scan in `lidar_<i>` columns.  Rows are fed in
//! order through a single detector, and one record per row is written to the
//! output file as CSV or JSON lines.
//!
//! Settings are layered: built-in defaults, then `~/.occlusion/config.toml`
//! (or `--config`), then `OCCLUSION_*` environment variables, then flags.

mod config;
mod telemetry;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use occlusion_records::{AnnotateSummary, OutputFormat, annotate_files};

use crate::config::Config;

#[derive(Parser, Debug, Default)]
#[command(name = "occlusion-detect")]
#[command(about = "Detect persistent lidar occlusions in a CSV of scans")]
struct Args {
    /// Input CSV with `lidar_<i>` columns
    #[arg(short, long, required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// Output file for the annotated records
    #[arg(short, long, required_unless_present = "print_config")]
    output: Option<PathBuf>,

    /// Config file (default: ~/.occlusion/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format: csv or jsonl
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Number of past frames kept for stability scoring
    #[arg(long)]
    history_size: Option<usize>,

    /// Minimum beams in a merged run
    #[arg(long)]
    min_segment_beams: Option<usize>,

    /// Largest valid gap bridged when merging runs
    #[arg(long)]
    gap_merge_beams: Option<usize>,

    /// Endpoint shift, in beams, beyond which a match counts as drifted
    #[arg(long)]
    drift_tolerance_beams: Option<usize>,

    /// Minimum stability for a segment to be reported
    #[arg(long)]
    persistence_threshold: Option<f64>,

    /// Minimum segment width in degrees
    #[arg(long)]
    min_occlusion_width_deg: Option<f64>,

    /// Bearing of lidar_0 in degrees
    #[arg(long, allow_negative_numbers = true)]
    angle_min_deg: Option<f64>,

    /// Angle covered by all beam columns, in degrees
    #[arg(long)]
    angle_span_deg: Option<f64>,

    /// Count readings at the sensor maximum as invalid beams
    #[arg(long)]
    treat_near_max_as_invalid: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let args = Args::parse();
    let _guard = telemetry::init_tracing("occlusion-detect");

    if let Err(e) = run(&args) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = config::load(args.config.as_deref())?;
    apply_args(&mut cfg, args);

    if args.print_config {
        print!("{}", toml::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let input = args.input.as_deref().ok_or("--input is required")?;
    let output = args.output.as_deref().ok_or("--output is required")?;

    let summary = annotate_files(
        input,
        output,
        cfg.detector(),
        &cfg.angles(),
        cfg.output_format,
    )?;
    print_summary(&summary, &output.display().to_string(), cfg.output_format);
    Ok(())
}

/// Apply command-line overrides on top of file and environment settings.
fn apply_args(cfg: &mut Config, args: &Args) {
    if let Some(v) = args.format {
        cfg.output_format = v;
    }
    if let Some(v) = args.history_size {
        cfg.history_size = v;
    }
    if let Some(v) = args.min_segment_beams {
        cfg.min_segment_beams = v;
    }
    if let Some(v) = args.gap_merge_beams {
        cfg.gap_merge_beams = v;
    }
    if let Some(v) = args.drift_tolerance_beams {
        cfg.drift_tolerance_beams = v;
    }
    if let Some(v) = args.persistence_threshold {
        cfg.persistence_threshold = v;
    }
    if let Some(v) = args.min_occlusion_width_deg {
        cfg.min_occlusion_width_deg = v;
    }
    if let Some(v) = args.angle_min_deg {
        cfg.angle_min_deg = v;
    }
    if let Some(v) = args.angle_span_deg {
        cfg.angle_span_deg = v;
    }
    if args.treat_near_max_as_invalid {
        cfg.treat_near_max_as_invalid = true;
    }
}

fn print_summary(summary: &AnnotateSummary, output: &str, format: OutputFormat) {
    println!("{}", "Occlusion annotation complete".green().bold());
    println!("  {:<18} {}", "Frames:".bold(), summary.frames);
    println!(
        "  {:<18} {}",
        "Occluded frames:".bold(),
        if summary.occluded_frames > 0 {
            summary.occluded_frames.to_string().yellow()
        } else {
            summary.occluded_frames.to_string().normal()
        }
    );
    println!("  {:<18} {}", "Max segments:".bold(), summary.max_segments);
    println!("  {:<18} {} ({})", "Written to:".bold(), output.cyan(), format);
}
