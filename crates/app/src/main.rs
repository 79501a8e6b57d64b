mod console;
mod logging;
#[cfg(feature = "opencv")]
mod video;

use std::fmt;
use std::path::PathBuf;

use chrono::Utc;
use finger_core::counter::ThumbRule;
use finger_core::quiz::{QuizConfig, QuizSession};
use services::bridge::DEFAULT_MIN_CONFIDENCE;
use services::{
    FrameLoop, FrameSink, FrameSource, HandDetector, LoopError, LoopOptions, LoopSummary,
    RandomQuestions, ReplayDetector, ReplaySource,
};

use crate::console::ConsoleSink;

/// The MediaPipe bridge shipped next to this crate.
const DEFAULT_DETECTOR: &str = concat!(
    "python3 ",
    env!("CARGO_MANIFEST_DIR"),
    "/hand_bridge.py"
);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCamera { raw: String },
    InvalidConfidence { raw: String },
    InvalidThumbRule { raw: String },
    InvalidSeed { raw: String },
    MissingReplayFile,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCamera { raw } => write!(f, "invalid --camera value: {raw}"),
            ArgsError::InvalidConfidence { raw } => {
                write!(f, "invalid --min-confidence value: {raw} (expected 0.0..=1.0)")
            }
            ArgsError::InvalidThumbRule { raw } => {
                write!(f, "invalid --thumb-rule value: {raw} (expected mirrored|handedness)")
            }
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::MissingReplayFile => write!(f, "replay requires a recording file"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[cfg(not(feature = "opencv"))]
#[derive(Debug)]
struct PlayUnavailable;

#[cfg(not(feature = "opencv"))]
impl fmt::Display for PlayUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "camera play needs the `opencv` feature: cargo run -p app --features opencv"
        )
    }
}

#[cfg(not(feature = "opencv"))]
impl std::error::Error for PlayUnavailable {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app --features opencv -- play [--camera <idx>] [--detector <cmd>]");
    eprintln!("                                        [--min-confidence <f>] [--thumb-rule <rule>]");
    eprintln!("  cargo run -p app -- replay <recording.jsonl> [--seed <n>] [--thumb-rule <rule>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --camera 0");
    eprintln!("  --detector \"{DEFAULT_DETECTOR}\"");
    eprintln!("  --min-confidence {DEFAULT_MIN_CONFIDENCE}");
    eprintln!("  --thumb-rule mirrored");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FINGER_QUIZ_CAMERA, FINGER_QUIZ_DETECTOR, FINGER_QUIZ_MIN_CONFIDENCE,");
    eprintln!("  FINGER_QUIZ_THUMB_RULE, FINGER_QUIZ_SEED, RUST_LOG");
    eprintln!();
    eprintln!("Press q in the video window to quit.");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Replay,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "replay" => Some(Self::Replay),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    #[cfg_attr(not(feature = "opencv"), allow(dead_code))]
    camera: i32,
    #[cfg_attr(not(feature = "opencv"), allow(dead_code))]
    detector: String,
    min_confidence: f32,
    thumb_rule: ThumbRule,
    seed: Option<u64>,
    recording: Option<PathBuf>,
}

impl Args {
    fn from_env() -> Result<Self, ArgsError> {
        let camera = match std::env::var("FINGER_QUIZ_CAMERA") {
            Ok(raw) => parse_camera(raw)?,
            Err(_) => 0,
        };
        let detector = std::env::var("FINGER_QUIZ_DETECTOR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DETECTOR.to_string());
        let min_confidence = match std::env::var("FINGER_QUIZ_MIN_CONFIDENCE") {
            Ok(raw) => parse_confidence(raw)?,
            Err(_) => DEFAULT_MIN_CONFIDENCE,
        };
        let thumb_rule = match std::env::var("FINGER_QUIZ_THUMB_RULE") {
            Ok(raw) => parse_thumb_rule(raw)?,
            Err(_) => ThumbRule::default(),
        };
        let seed = match std::env::var("FINGER_QUIZ_SEED") {
            Ok(raw) => Some(parse_seed(raw)?),
            Err(_) => None,
        };

        Ok(Self {
            camera,
            detector,
            min_confidence,
            thumb_rule,
            seed,
            recording: None,
        })
    }

    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env()?;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--camera" => parsed.camera = parse_camera(require_value(args, "--camera")?)?,
                "--detector" => {
                    let value = require_value(args, "--detector")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::MissingValue { flag: "--detector" });
                    }
                    parsed.detector = value;
                }
                "--min-confidence" => {
                    parsed.min_confidence =
                        parse_confidence(require_value(args, "--min-confidence")?)?;
                }
                "--thumb-rule" => {
                    parsed.thumb_rule = parse_thumb_rule(require_value(args, "--thumb-rule")?)?;
                }
                "--seed" => parsed.seed = Some(parse_seed(require_value(args, "--seed")?)?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if cmd == Command::Replay
                    && parsed.recording.is_none()
                    && !arg.starts_with("--") =>
                {
                    parsed.recording = Some(PathBuf::from(arg));
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if cmd == Command::Replay && parsed.recording.is_none() {
            return Err(ArgsError::MissingReplayFile);
        }
        Ok(parsed)
    }

    fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            thumb_rule: self.thumb_rule,
            ..LoopOptions::default()
        }
    }
}

fn parse_camera(raw: String) -> Result<i32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidCamera { raw })
}

fn parse_confidence(raw: String) -> Result<f32, ArgsError> {
    match raw.trim().parse::<f32>() {
        Ok(value) if (0.0..=1.0).contains(&value) => Ok(value),
        _ => Err(ArgsError::InvalidConfidence { raw }),
    }
}

fn parse_thumb_rule(raw: String) -> Result<ThumbRule, ArgsError> {
    ThumbRule::from_name(&raw).ok_or(ArgsError::InvalidThumbRule { raw })
}

fn parse_seed(raw: String) -> Result<u64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidSeed { raw })
}

/// Builds the session and runs the loop until it stops.
fn drive<S, D, K>(
    source: S,
    detector: D,
    sink: K,
    options: LoopOptions,
    seed: Option<u64>,
) -> Result<LoopSummary, LoopError>
where
    S: FrameSource,
    D: HandDetector<Frame = S::Frame>,
    K: FrameSink<Frame = S::Frame>,
{
    let config = QuizConfig::default();
    match seed {
        Some(seed) => {
            let session = QuizSession::new(config.clone(), RandomQuestions::seeded(&config, seed));
            FrameLoop::new(source, detector, sink, session)
                .with_options(options)
                .run()
        }
        None => {
            let session = QuizSession::new(config.clone(), RandomQuestions::new(&config));
            FrameLoop::new(source, detector, sink, session)
                .with_options(options)
                .run()
        }
    }
}

#[cfg(feature = "opencv")]
fn play(args: &Args) -> Result<LoopSummary, Box<dyn std::error::Error>> {
    use services::BridgeProcess;

    use crate::video::{BridgeOnMat, Camera, Window};

    // Open the detector first: it is the slowest to start and the likeliest to fail.
    let detector =
        BridgeProcess::spawn(&args.detector)?.with_min_confidence(args.min_confidence);
    let camera = Camera::open(args.camera)?;
    let window = Window::open()?;

    Ok(drive(
        camera,
        BridgeOnMat::new(detector),
        window,
        args.loop_options(),
        args.seed,
    )?)
}

#[cfg(not(feature = "opencv"))]
fn play(_args: &Args) -> Result<LoopSummary, Box<dyn std::error::Error>> {
    Err(Box::new(PlayUnavailable))
}

fn replay(args: &Args) -> Result<LoopSummary, Box<dyn std::error::Error>> {
    let path = args.recording.as_ref().ok_or(ArgsError::MissingReplayFile)?;
    let source = ReplaySource::open(path, Utc::now())?.with_min_confidence(args.min_confidence);

    Ok(drive(
        source,
        ReplayDetector,
        ConsoleSink::default(),
        args.loop_options(),
        args.seed,
    )?)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    logging::init();
    tracing::debug!(?args, "parsed arguments");

    let summary = match cmd {
        Command::Play => play(&args)?,
        Command::Replay => replay(&args)?,
    };

    tracing::info!(
        frames = summary.frames,
        empty_frames = summary.empty_frames,
        solved = summary.solved,
        "session finished"
    );
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
