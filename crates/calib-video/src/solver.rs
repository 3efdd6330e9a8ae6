//! Joint camera calibration over all sampled views.

use std::io::{self, Write};

use calib_video_core::{
    object_points, BoardPattern, CalibError, CalibrationFrame, CalibrationResult, CellSize,
    ImageSize, IntrinsicMatrix, SolverModel,
};
use log::{info, warn};
use nalgebra::{Matrix3, Point2, Point3};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Raw output of a calibration backend, before validation.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendCalibration {
    pub camera_matrix: Matrix3<f64>,
    /// Distortion vector in `{k1, k2, p1, p2, k3, ...}` order.
    pub coefficients: Vec<f64>,
    pub rmse: f64,
}

/// Nonlinear camera-calibration solver.
///
/// `object_points[i]` and `image_points[i]` describe view `i`; all views are
/// solved jointly. Terms fixed by `model` must stay at zero.
pub trait CalibrationBackend {
    fn calibrate(
        &mut self,
        object_points: &[&[Point3<f32>]],
        image_points: &[&[Point2<f32>]],
        image_size: ImageSize,
        model: SolverModel,
    ) -> Result<BackendCalibration, CalibError>;
}

/// Calibrate from accepted frames with the default fixed-term model
/// (no tangential distortion, `k3..k6 = 0`).
pub fn calibrate_camera<F, B>(
    frames: &[CalibrationFrame<F>],
    pattern: BoardPattern,
    cell_size: CellSize,
    backend: &mut B,
) -> Result<CalibrationResult, CalibError>
where
    B: CalibrationBackend,
{
    calibrate_camera_with_model(frames, pattern, cell_size, SolverModel::default(), backend)
}

/// Calibrate from accepted frames.
///
/// Fails with [`CalibError::EmptyDataset`] before touching the backend when
/// `frames` is empty. Every frame must share the first frame's image size
/// and carry exactly `pattern.corner_count()` corners. One object-point
/// template is built and shared by every view.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(frames, backend), fields(views = frames.len()))
)]
pub fn calibrate_camera_with_model<F, B>(
    frames: &[CalibrationFrame<F>],
    pattern: BoardPattern,
    cell_size: CellSize,
    model: SolverModel,
    backend: &mut B,
) -> Result<CalibrationResult, CalibError>
where
    B: CalibrationBackend,
{
    let first = frames.first().ok_or(CalibError::EmptyDataset)?;
    let image_size = first.image_size;
    let expected = pattern.corner_count();

    for (index, frame) in frames.iter().enumerate() {
        if frame.image_size != image_size {
            return Err(CalibError::ImageSizeMismatch {
                index,
                expected: image_size,
                got: frame.image_size,
            });
        }
        if frame.corners.len() != expected {
            return Err(CalibError::CornerCountMismatch {
                index,
                expected,
                got: frame.corners.len(),
            });
        }
    }

    if frames.len() == 1 {
        warn!("calibrating from a single view; the reprojection error is less reliable");
    }

    let template = object_points(pattern, cell_size);
    let object: Vec<&[Point3<f32>]> = frames.iter().map(|_| template.as_slice()).collect();
    let image: Vec<&[Point2<f32>]> = frames.iter().map(|f| f.corners.as_slice()).collect();

    info!(
        "solving {} view(s) of a {}x{} board at {image_size}",
        frames.len(),
        pattern.cols,
        pattern.rows
    );
    let raw = backend.calibrate(&object, &image, image_size, model)?;

    let intrinsics = IntrinsicMatrix::from_matrix(raw.camera_matrix)?;
    let distortion = model.constrain(&raw.coefficients);
    let dropped = raw
        .coefficients
        .iter()
        .zip(distortion.as_array().iter().chain(std::iter::repeat(&0.0)))
        .any(|(got, kept)| got != kept);
    if dropped {
        warn!(
            "backend returned nonzero values for fixed distortion terms: {:?}",
            raw.coefficients
        );
    }

    let result = CalibrationResult {
        intrinsics,
        distortion,
        rmse: raw.rmse,
        image_size,
        views: frames.len(),
    };
    info!("calibration done, rmse = {:.4}", result.rmse);
    Ok(result)
}

/// Print the human-readable report to stdout, preceded by a blank line.
pub fn print_summary(result: &CalibrationResult) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out)?;
    writeln!(out, "{result}")
}
