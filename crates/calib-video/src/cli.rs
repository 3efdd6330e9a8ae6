//! Command-line arguments for the `calib-video` binary.

use std::path::PathBuf;

use calib_video_core::{
    BoardPattern, CalibError, CellSize, DistortionCoefficients, IntrinsicMatrix,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;

use crate::rectifier::{KeyBindings, RectifierConfig, ViewMode};
use crate::sampler::SamplerParams;

pub const DEFAULT_VIDEO: &str = "chessboard.mp4";

#[derive(Parser, Debug)]
#[command(
    name = "calib-video",
    version,
    about = "Checkerboard camera calibration and live distortion correction from video"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Warn,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sample board views from a video and solve for intrinsics and distortion.
    Calibrate(CalibrateArgs),
    /// Play a video with an original/rectified toggle ('r') until ESC.
    Rectify(RectifyArgs),
}

#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Video file. Defaults to chessboard.mp4 next to the executable.
    pub video: Option<PathBuf>,

    /// Internal corners along the board width.
    #[arg(long, default_value_t = 10)]
    pub cols: u32,

    /// Internal corners along the board height.
    #[arg(long, default_value_t = 7)]
    pub rows: u32,

    /// Edge length of one board square (any unit).
    #[arg(long, default_value_t = 1.0)]
    pub cell_size: f32,

    /// Maximum number of board views to collect.
    #[arg(long, default_value_t = 30)]
    pub max_frames: usize,

    /// Test only every N-th frame.
    #[arg(long, default_value_t = 5)]
    pub stride: usize,

    /// Show each accepted frame with its corners.
    #[arg(long)]
    pub visualize: bool,

    /// Also print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

impl CalibrateArgs {
    pub fn video_path(&self) -> PathBuf {
        self.video.clone().unwrap_or_else(default_video_path)
    }

    pub fn board_pattern(&self) -> Result<BoardPattern, CalibError> {
        BoardPattern::new(self.cols, self.rows)
    }

    pub fn cell_size(&self) -> Result<CellSize, CalibError> {
        CellSize::new(self.cell_size)
    }

    pub fn sampler_params(&self) -> SamplerParams {
        SamplerParams {
            max_frames: self.max_frames,
            stride: self.stride,
            visualize: self.visualize,
        }
    }
}

#[derive(Args, Debug)]
pub struct RectifyArgs {
    /// Video file. Defaults to chessboard.mp4 next to the executable.
    pub video: Option<PathBuf>,

    #[arg(long, default_value_t = 1972.3442)]
    pub fx: f64,

    #[arg(long, default_value_t = 1920.0901)]
    pub fy: f64,

    #[arg(long, default_value_t = 1042.9267)]
    pub cx: f64,

    #[arg(long, default_value_t = 296.8256)]
    pub cy: f64,

    /// First radial distortion term.
    #[arg(long, default_value_t = -0.167291, allow_negative_numbers = true)]
    pub k1: f64,

    /// Second radial distortion term.
    #[arg(long, default_value_t = 0.543998, allow_negative_numbers = true)]
    pub k2: f64,

    /// Key that toggles between original and rectified view (printable ASCII).
    #[arg(long, default_value_t = 'r', value_parser = parse_toggle_key)]
    pub toggle_key: char,

    /// Start in the original view instead of the rectified one.
    #[arg(long)]
    pub start_original: bool,
}

impl RectifyArgs {
    pub fn config(&self) -> Result<RectifierConfig, CalibError> {
        Ok(RectifierConfig {
            video: self.video.clone().unwrap_or_else(default_video_path),
            intrinsics: IntrinsicMatrix::new(self.fx, self.fy, self.cx, self.cy)?,
            distortion: DistortionCoefficients::radial(self.k1, self.k2),
            keys: KeyBindings {
                toggle: self.toggle_key as i32,
                ..KeyBindings::default()
            },
            initial_mode: if self.start_original {
                ViewMode::Original
            } else {
                ViewMode::Rectified
            },
        })
    }
}

/// Polled key codes are compared on their low byte, so only printable ASCII
/// keys can ever match.
fn parse_toggle_key(value: &str) -> Result<char, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_graphic() => Ok(c),
        (Some(_), None) => Err(format!("toggle key must be printable ASCII, got {value:?}")),
        _ => Err(format!("toggle key must be a single character, got {value:?}")),
    }
}

/// `chessboard.mp4` in the directory of the running executable, or in the
/// working directory if that cannot be determined.
pub fn default_video_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_VIDEO)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_VIDEO))
}
