use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imgfit", version, about = "Fit images into a target box")]
struct Cli {
    /// Input files (png, jpg, gif, svg; anything else is decoded as a still image).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target width in pixels. Omit to derive it from each source's aspect ratio.
    #[arg(short = 'W', long, allow_negative_numbers = true)]
    width: Option<i64>,

    /// Target height in pixels. Omit to derive it from each source's aspect ratio.
    #[arg(short = 'H', long, allow_negative_numbers = true)]
    height: Option<i64>,

    /// Placement mode.
    #[arg(long, value_enum)]
    mode: Option<ModeChoice>,

    /// Background color as "r,g,b" or "r,g,b,a".
    #[arg(long, value_name = "R,G,B[,A]")]
    bg: Option<String>,

    /// JPEG quality (1-100).
    #[arg(long, allow_negative_numbers = true)]
    quality: Option<i64>,

    /// Output directory, created if missing.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Worker threads. Defaults to one per core.
    #[arg(long)]
    jobs: Option<usize>,

    /// JSON job file; flags given on the command line override its values.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Stretch,
    Fit,
    Pad,
    Fill,
}

impl From<ModeChoice> for imgfit::PlacementMode {
    fn from(m: ModeChoice) -> Self {
        match m {
            ModeChoice::Stretch => Self::Stretch,
            ModeChoice::Fit => Self::Fit,
            ModeChoice::Pad => Self::Pad,
            ModeChoice::Fill => Self::Fill,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = build_config(&cli)?;
    let job = cfg.validate().context("invalid configuration")?;

    let report = imgfit::run_job(&job, &cli.inputs)?;

    for f in &report.files {
        match &f.outcome {
            Ok(out) => println!("wrote {}", out.display()),
            Err(e) => eprintln!("error: {}: {e}", f.input.display()),
        }
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_config(cli: &Cli) -> anyhow::Result<imgfit::ResizeConfig> {
    let mut cfg = match &cli.config {
        Some(path) => imgfit::ResizeConfig::from_json_file(path)?,
        None => imgfit::ResizeConfig::default(),
    };

    if cli.width.is_some() {
        cfg.width = cli.width;
    }
    if cli.height.is_some() {
        cfg.height = cli.height;
    }
    if let Some(mode) = cli.mode {
        cfg.mode = mode.into();
    }
    if let Some(bg) = &cli.bg {
        let color = imgfit::parse_color(bg)?;
        cfg.background = Some(color.to_array().map(i64::from).to_vec());
    }
    if cli.quality.is_some() {
        cfg.jpeg_quality = cli.quality;
    }
    if cli.out_dir.is_some() {
        cfg.out_dir = cli.out_dir.clone();
    }
    if cli.jobs.is_some() {
        cfg.threads = cli.jobs;
    }
    Ok(cfg)
}
