//! Checkerboard camera calibration and live lens-distortion correction from
//! video.
//!
//! Two decoupled pipelines:
//! - sampling + calibration: [`sampler::extract_chessboard_images`] collects
//!   board views from a [`FrameSource`], then [`solver::calibrate_camera`]
//!   runs one joint solve over all of them;
//! - live rectification: [`rectifier::run_rectifier`] plays a source through
//!   a two-state original/rectified view with a cached undistortion map.
//!
//! The vision work itself (corner detection, the calibration solver, map
//! generation, remapping, decoding, display) sits behind small traits. The
//! `opencv` feature provides the concrete implementations in [`cv`].
//!
//! ## Quickstart
//!
//! ```no_run
//! # #[cfg(feature = "opencv")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use calib_video::core::{BoardPattern, CellSize};
//! use calib_video::cv;
//!
//! let pattern = BoardPattern::new(10, 7)?;
//! let frames = cv::extract_chessboard_images("chessboard.mp4", pattern, 30, false)?;
//! if !frames.is_empty() {
//!     let result = cv::calibrate_camera(&frames, pattern, CellSize::new(1.0)?)?;
//!     println!("rmse = {:.4}", result.rmse);
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "opencv"))]
//! # fn main() {}
//! ```
//!
//! ## API map
//! - `calib_video::core`: board geometry, camera model, results, errors.
//! - `calib_video::sampler`: frame sampling and board detection seam.
//! - `calib_video::solver`: joint calibration over accepted views.
//! - `calib_video::pipeline`: sampling and calibration chained, with the
//!   empty-sample gate.
//! - `calib_video::rectifier`: the original/rectified view state machine.
//! - `calib_video::cv` (feature `opencv`): OpenCV-backed implementations.
//! - `calib_video::cli` (feature `cli`): command-line arguments.

pub use calib_video_core as core;

pub mod pipeline;
pub mod rectifier;
pub mod sampler;
pub mod solver;
mod source;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "opencv")]
pub mod cv;

pub use calib_video_core::{
    BoardPattern, CalibError, CalibrationFrame, CalibrationResult, CellSize,
    DistortionCoefficients, ImageSize, IntrinsicMatrix,
};
pub use source::{FrameIter, FrameSource, Raster};
