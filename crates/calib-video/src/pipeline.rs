//! Sample -> gate -> solve, the offline calibration flow end to end.

use calib_video_core::{BoardPattern, CalibError, CalibrationResult, CellSize};
use log::{info, warn};

use crate::sampler::{self, BoardDetector, DetectionPreview, SamplerParams};
use crate::solver::{self, CalibrationBackend};
use crate::FrameSource;

/// Sample board views from `source` and calibrate from them.
///
/// Returns `Ok(None)` without touching `backend` when no frame qualified.
pub fn calibrate_from_source<S, D, P, B>(
    source: &mut S,
    detector: &mut D,
    preview: &mut P,
    backend: &mut B,
    pattern: BoardPattern,
    cell_size: CellSize,
    params: &SamplerParams,
) -> Result<Option<CalibrationResult>, CalibError>
where
    S: FrameSource,
    D: BoardDetector<S::Frame>,
    P: DetectionPreview<S::Frame>,
    B: CalibrationBackend,
{
    let frames = sampler::extract_chessboard_images(source, detector, pattern, params, preview)?;
    if frames.is_empty() {
        warn!("no valid chessboard frames found, skipping calibration");
        return Ok(None);
    }
    info!("performing camera calibration on {} view(s)", frames.len());
    solver::calibrate_camera(&frames, pattern, cell_size, backend).map(Some)
}
