//! Launch telemetry CLI.
//!
//! Extracts HUD telemetry from a launch video into a timestamped session
//! folder holding `telemetry.csv`, `telemetry.json` and `session.log`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use launch_telemetry::config::{StopMode, load_config};
use launch_telemetry::ocr::{TesseractRecognizer, locate_tesseract, setup::verify_language};
use launch_telemetry::output::{CsvSink, RecordSink, TableSink};
use launch_telemetry::paths::SessionPaths;
use launch_telemetry::pipeline::{NoPreview, Orchestrator, Preview, SnapshotPreview};
use launch_telemetry::profile::{self, VehicleId};
use launch_telemetry::video::{FfmpegSource, FrameSource, ImageSequenceSource};

#[derive(Parser)]
#[command(name = "launch-telemetry")]
#[command(about = "Extract HUD telemetry from rocket launch videos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a video file or a folder of frames
    Run {
        /// Video file, or a directory of still frames
        video: PathBuf,
        /// Vehicle profile (see `profiles`)
        #[arg(long)]
        profile: String,
        /// Video time to start at (HH:MM:SS or MM:SS)
        #[arg(long, default_value = "00:00:00")]
        start: String,
        /// Mission clock at which to stop, as shown on the overlay
        #[arg(long)]
        stop: String,
        /// Folder that receives the session folder
        #[arg(long, default_value = "output")]
        output: PathBuf,
        /// Config file (defaults to config.json next to the executable)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Process every Nth frame
        #[arg(long)]
        stride: Option<u64>,
        #[arg(long, value_enum)]
        stop_mode: Option<StopMode>,
        /// Frame rate of a frame directory, used for --start
        #[arg(long, default_value_t = 30.0)]
        fps: f64,
        /// Save every Nth annotated sampled frame
        #[arg(long)]
        preview_every: Option<u64>,
        #[arg(short, long)]
        verbose: bool,
    },
    /// List vehicle profiles
    Profiles,
}

struct RunArgs {
    video: PathBuf,
    profile: String,
    start: String,
    stop: String,
    output: PathBuf,
    config: Option<PathBuf>,
    stride: Option<u64>,
    stop_mode: Option<StopMode>,
    fps: f64,
    preview_every: Option<u64>,
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            video,
            profile,
            start,
            stop,
            output,
            config,
            stride,
            stop_mode,
            fps,
            preview_every,
            verbose,
        } => {
            let args = RunArgs {
                video,
                profile,
                start,
                stop,
                output,
                config,
                stride,
                stop_mode,
                fps,
                preview_every,
                verbose,
            };
            match run(args) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Profiles => {
            list_profiles();
            ExitCode::SUCCESS
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    // Unknown profiles fail before anything is created on disk
    let vehicle = profile::lookup(&args.profile)?;

    let session = SessionPaths::create(&args.output).with_context(|| {
        format!("Failed to create session folder under {}", args.output.display())
    })?;
    launch_telemetry::logging::init_logging(Some(&session.log), args.verbose)?;
    log::info!("Session folder: {}", session.dir.display());

    let mut config = load_config(args.config.as_deref())?;
    if let Some(stride) = args.stride {
        config.stride = stride;
    }
    if let Some(mode) = args.stop_mode {
        config.stop_mode = mode;
    }
    if let Some(every) = args.preview_every {
        config.preview_every = every;
    }
    let config = config.validated()?;

    let tesseract = locate_tesseract(&config)?;
    if let Err(e) = verify_language(&tesseract) {
        log::warn!("{e:#}");
    }
    let recognizer = TesseractRecognizer::new(tesseract, config.ocr_page_seg_mode);

    let mut source = open_source(&args.video, args.fps)?;
    let mut csv = CsvSink::create(&session.csv, config.record_layout)?;
    let mut table = TableSink::new(&session.table, config.record_layout);

    let preview: Box<dyn Preview> = if config.preview_every > 0 {
        Box::new(SnapshotPreview::new(session.previews.clone(), config.preview_every))
    } else {
        Box::new(NoPreview)
    };

    let mut orchestrator =
        Orchestrator::new(vehicle, config, &recognizer)?.with_preview(preview);
    orchestrator
        .abort_handle()
        .abort_on_interrupt()
        .context("Failed to install Ctrl-C handler")?;
    let summary = orchestrator.run(
        source.as_mut(),
        &mut [&mut csv as &mut dyn RecordSink, &mut table],
        &args.start,
        &args.stop,
    )?;

    println!("Stopped: {}", summary.stop_reason);
    println!("  frames read:  {}", summary.frames_read);
    println!("  records:      {}", summary.records);
    if summary.frames_out_of_bounds > 0 {
        println!("  out of frame: {}", summary.frames_out_of_bounds);
    }
    if summary.read_failures > 0 {
        println!("  read errors:  {}", summary.read_failures);
    }
    if let Some(clock) = &summary.last_clock {
        println!("  last clock:   {clock}");
    }
    println!("  output:       {}", session.dir.display());
    Ok(())
}

fn open_source(path: &Path, fps: f64) -> Result<Box<dyn FrameSource>> {
    if path.is_dir() {
        let source = ImageSequenceSource::open(path, fps)?;
        anyhow::ensure!(!source.is_empty(), "No frames found in {}", path.display());
        Ok(Box::new(source))
    } else {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
}

fn list_profiles() {
    for id in VehicleId::ALL {
        let p = profile::profile(id);
        println!("{id}");
        println!("  speed:         {}", p.speed);
        println!("  altitude:      {}", p.altitude);
        println!("  mission clock: {}", p.mission_clock);
        match &p.gauges {
            Some(g) => {
                println!("  lox gauge:     x {}..{} at y {}", g.lox.x1, g.lox.x2, g.lox.y);
                println!("  ch4 gauge:     x {}..{} at y {}", g.ch4.x1, g.ch4.x2, g.ch4.y);
            }
            None => println!("  gauges:        none"),
        }
    }
}
