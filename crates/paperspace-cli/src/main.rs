//! paperspace CLI: replay recorded detections through a configured space.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use paperspace::papers::ButtonEvent;
use paperspace::tracking::Detection;
use paperspace::{Collaborators, DrawCommand, PaperId, PaperKind, Session};
use serde::{Deserialize, Serialize};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "paperspace")]
#[command(about = "Run tracked paper overlays against recorded marker detections")]
#[command(version)]
struct Cli {
    /// Log verbosity.
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Emit structured JSON logs through `tracing`.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a detection log and write a per-frame report.
    Replay(ReplayArgs),

    /// Load a configuration and list the papers it defines.
    Check {
        /// App configuration (paperspace.json).
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct ReplayArgs {
    /// App configuration (paperspace.json).
    #[arg(long)]
    config: PathBuf,

    /// Recorded frames (JSON array of {t, detections, buttons}).
    #[arg(long)]
    frames: PathBuf,

    /// Where to write the report; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Include every draw command in the report.
    #[arg(long)]
    draws: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum ReplayError {
    #[error("{}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("frame {index}: invalid timestamp {t}")]
    Timestamp { index: usize, t: f64 },
    #[error("frame {index}: timestamp {t} goes backwards")]
    Backwards { index: usize, t: f64 },
}

#[derive(Debug, Deserialize)]
struct ButtonRecord {
    topic: String,
    event: ButtonEvent,
}

/// One recorded camera frame.
#[derive(Debug, Deserialize)]
struct FrameRecord {
    /// Seconds since the start of the recording.
    t: f64,
    #[serde(default)]
    detections: Vec<Detection>,
    /// Button events delivered before this frame.
    #[serde(default)]
    buttons: Vec<ButtonRecord>,
}

#[derive(Debug, Serialize)]
struct PaperEntry {
    id: PaperId,
    kind: PaperKind,
}

#[derive(Debug, Serialize)]
struct FrameReport {
    t: f64,
    visible: Vec<PaperId>,
    faulted: Vec<PaperId>,
    draw_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    draws: Option<Vec<DrawCommand>>,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    papers: Vec<PaperEntry>,
    skipped: Vec<String>,
    frames: Vec<FrameReport>,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Commands::Replay(args) => run_replay(&args),
        Commands::Check { config } => run_check(&config),
    }
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> CliResult<()> {
    paperspace_core::init_tracing(cli.json_logs);
    let _ = tracing_log::LogTracer::init();
    log::debug!(
        "RUST_LOG controls tracing output; --log-level {:?} ignored",
        cli.log_level
    );
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> CliResult<()> {
    paperspace_core::init_with_level(cli.log_level.into())?;
    Ok(())
}

fn load_frames(path: &Path) -> Result<Vec<FrameRecord>, ReplayError> {
    let raw = fs::read_to_string(path).map_err(|source| ReplayError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let frames: Vec<FrameRecord> =
        serde_json::from_str(&raw).map_err(|source| ReplayError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut last = 0.0;
    for (index, frame) in frames.iter().enumerate() {
        if !(frame.t.is_finite() && frame.t >= 0.0) {
            return Err(ReplayError::Timestamp { index, t: frame.t });
        }
        if frame.t < last {
            return Err(ReplayError::Backwards { index, t: frame.t });
        }
        last = frame.t;
    }
    Ok(frames)
}

fn run_replay(args: &ReplayArgs) -> CliResult<()> {
    let (mut session, skipped) = Session::from_config(&args.config, Collaborators::default())?;
    let frames = load_frames(&args.frames)?;
    log::info!("replaying {} frames", frames.len());

    let papers = session
        .space()
        .ids()
        .filter_map(|id| session.space().kind(id).map(|kind| PaperEntry { id, kind }))
        .collect();

    let start = Instant::now();
    let mut reports = Vec::with_capacity(frames.len());
    for frame in frames {
        for button in &frame.buttons {
            session.buttons_mut().publish(&button.topic, button.event);
        }
        let now = start + Duration::from_secs_f64(frame.t);
        let draws = session.step(None, &frame.detections, now);
        reports.push(FrameReport {
            t: frame.t,
            visible: session.space().visible_ids(),
            faulted: session.space().faulted_ids(),
            draw_count: draws.len(),
            draws: args.draws.then(|| draws.into_commands()),
        });
    }
    session.shutdown();

    let report = ReplayReport {
        papers,
        skipped: skipped.iter().map(ToString::to_string).collect(),
        frames: reports,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(path) => {
            fs::write(path, json)?;
            log::info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_check(config: &Path) -> CliResult<()> {
    let (session, skipped) = Session::from_config(config, Collaborators::default())?;
    let space = session.space();
    for id in space.ids() {
        let kind = space.kind(id).map(|k| k.as_str()).unwrap_or("?");
        match space.shape(id) {
            Some(shape) => println!("paper {id}: {kind} on {shape}"),
            None => println!("paper {id}: {kind}"),
        }
    }
    for err in &skipped {
        println!("skipped: {err}");
    }
    println!("{} papers, {} skipped", space.len(), skipped.len());
    Ok(())
}
