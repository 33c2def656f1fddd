//! pupil - demonstration driver for the pupil detection pipeline
//!
//! Feeds a directory of frames through [`pupil_pipeline::detect`], carrying
//! the tracker state forward from frame to frame, and writes one JSON line
//! of result state per frame. This binary is the "surrounding application
//! shell" the core pipeline explicitly treats as an external collaborator;
//! it exists to exercise the library end-to-end and to give the ambient
//! logging/config stack somewhere to live.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pupil_core::{BgrImage, DetectionConfig, OtherPriorState, TrackerState};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "pupil")]
#[command(author, version, about = "Per-frame pupil detection driver")]
#[command(long_about = "
Runs the pupil detection pipeline over a directory of frames, carrying the
tracker's running state from one frame to the next.

Examples:
  pupil run frames/                          # detect over frames/*.png, stdout
  pupil run frames/ -o results.jsonl         # write results to a file
  pupil run frames/ --config session.toml   # load a tuned DetectionConfig
  pupil default-config                       # print the default config as TOML
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write log to file (-l default, -l path.log custom)
    #[arg(short = 'l', long = "log", global = true)]
    log: Option<Option<PathBuf>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the pupil across every frame in a directory, in filename order.
    Run(RunArgs),
    /// Print `DetectionConfig::default()` as TOML, for use as a `--config` seed.
    DefaultConfig,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Directory containing frame images (png/jpg), processed in sorted
    /// filename order.
    frames: PathBuf,

    /// TOML file holding a `DetectionConfig`; defaults are used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file holding the initial `TrackerState`; a fresh
    /// `TrackerState::initial` is used if omitted.
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// JSON file holding an `OtherPriorState` for second-feature exclusion.
    #[arg(long)]
    other_prior: Option<PathBuf>,

    /// Output path for the JSON-lines result stream; stdout if omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log.as_ref().and_then(|l| l.as_ref()));

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::DefaultConfig => {
            let config = DetectionConfig::default();
            let toml = toml::to_string_pretty(&config).context("serializing default config")?;
            print!("{toml}");
            Ok(())
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => DetectionConfig::default(),
    };

    let mut state = match &args.seed {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading seed state {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing seed state {}", path.display()))?
        }
        None => TrackerState::initial(&config),
    };

    let other_prior: Option<OtherPriorState> = match &args.other_prior {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading other-prior {}", path.display()))?;
            Some(
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing other-prior {}", path.display()))?,
            )
        }
        None => None,
    };

    let mut frame_paths: Vec<PathBuf> = std::fs::read_dir(&args.frames)
        .with_context(|| format!("reading frame directory {}", args.frames.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();
    frame_paths.sort();

    if frame_paths.is_empty() {
        warn!(dir = %args.frames.display(), "no frames found");
    }

    let mut sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout()),
    };

    for path in &frame_paths {
        let frame = decode_frame(path)
            .with_context(|| format!("decoding frame {}", path.display()))?;
        state = pupil_pipeline::detect(&frame, &config, &state, other_prior.as_ref());

        info!(
            frame = %path.display(),
            pupil_detected = state.pupil_detected,
            error_detected = state.error_detected,
            "processed frame"
        );

        let record = FrameResult {
            frame: path.display().to_string(),
            state: &state,
        };
        serde_json::to_writer(&mut sink, &record).context("writing result line")?;
        sink.write_all(b"\n")?;
    }

    sink.flush()?;
    Ok(())
}

#[derive(serde::Serialize)]
struct FrameResult<'a> {
    frame: String,
    #[serde(flatten)]
    state: &'a TrackerState,
}

fn is_supported_image(path: &std::path::Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("png") | Some("jpg") | Some("jpeg")
    )
}

fn decode_frame(path: &std::path::Path) -> Result<BgrImage> {
    let dynamic = image::open(path)?;
    let rgb = dynamic.to_rgb8();
    let (width, height) = rgb.dimensions();
    let data = rgb
        .pixels()
        .map(|p| [p.0[2], p.0[1], p.0[0]])
        .collect::<Vec<[u8; 3]>>();
    Ok(BgrImage::from_pixels(width, height, data)?)
}

/// Initialize tracing based on verbosity level.
fn init_tracing(verbose: u8, log_path: Option<&PathBuf>) {
    let filter = match verbose {
        0 => "warn",
        1 => "pupil=info",
        2 => "pupil=debug",
        _ => "pupil=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if let Some(path) = log_path {
        let log_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let log_filename = path.file_name().unwrap_or(std::ffi::OsStr::new("pupil.log"));
        let file_appender = tracing_appender::rolling::never(log_dir, log_filename);

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .with_ansi(false)
            .with_writer(file_appender)
            .init();
    } else if verbose > 0 {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .init();
    }
}
