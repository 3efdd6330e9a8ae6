//! Core types for checkerboard camera calibration from video.
//!
//! This crate is intentionally small. It holds the board geometry, the
//! camera model, the calibration result and the undistortion map cache, and
//! does *not* depend on any concrete vision library.

mod board;
mod camera;
mod error;
mod frame;
mod logger;
mod report;
mod undistort;

pub use board::{object_points, BoardPattern, CellSize};
pub use camera::{CalibrationResult, DistortionCoefficients, IntrinsicMatrix, SolverModel};
pub use error::CalibError;
pub use frame::{CalibrationFrame, ImageSize};
pub use report::format_coefficients;
pub use undistort::UndistortionCache;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
