//! Frame sampling: pick every `stride`-th frame, keep the ones with a fully
//! detected board, stop at `max_frames`.

use calib_video_core::{BoardPattern, CalibError, CalibrationFrame};
use log::{debug, info};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{FrameSource, Raster};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Finds the internal corners of a checkerboard in one frame.
///
/// Implementations do their own grayscale conversion and sub-pixel
/// refinement. `Ok(None)` is a detection miss; errors are reserved for
/// failures of the underlying library.
pub trait BoardDetector<F> {
    fn detect(
        &mut self,
        frame: &F,
        pattern: BoardPattern,
    ) -> Result<Option<Vec<Point2<f32>>>, CalibError>;
}

/// Diagnostic display of accepted frames. Never influences selection.
pub trait DetectionPreview<F> {
    fn show(
        &mut self,
        frame: &F,
        pattern: BoardPattern,
        corners: &[Point2<f32>],
    ) -> Result<(), CalibError>;
}

/// Preview that shows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPreview;

impl<F> DetectionPreview<F> for NoPreview {
    fn show(&mut self, _: &F, _: BoardPattern, _: &[Point2<f32>]) -> Result<(), CalibError> {
        Ok(())
    }
}

/// Sampling settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerParams {
    /// Upper bound on collected frames.
    pub max_frames: usize,
    /// Only frames with `index % stride == 0` are tested.
    pub stride: usize,
    /// Show accepted frames with corners overlaid.
    pub visualize: bool,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            max_frames: 30,
            stride: 5,
            visualize: false,
        }
    }
}

impl SamplerParams {
    pub fn validate(&self) -> Result<(), CalibError> {
        if self.max_frames == 0 {
            return Err(CalibError::InvalidSamplerParams("max_frames must be >= 1"));
        }
        if self.stride == 0 {
            return Err(CalibError::InvalidSamplerParams("stride must be >= 1"));
        }
        Ok(())
    }
}

/// Collect up to `params.max_frames` frames with a complete board detection.
///
/// Frames are read in source order; a frame is only handed to the detector
/// when its index is a multiple of `params.stride`. A detection whose corner
/// count differs from `pattern.corner_count()` counts as a miss. Misses are
/// skipped without retry. An empty result means no frame qualified; the
/// caller decides whether to go on.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(source, detector, preview),
        fields(cols = pattern.cols, rows = pattern.rows)
    )
)]
pub fn extract_chessboard_images<S, D, P>(
    source: &mut S,
    detector: &mut D,
    pattern: BoardPattern,
    params: &SamplerParams,
    preview: &mut P,
) -> Result<Vec<CalibrationFrame<S::Frame>>, CalibError>
where
    S: FrameSource,
    D: BoardDetector<S::Frame>,
    P: DetectionPreview<S::Frame>,
{
    params.validate()?;
    let expected = pattern.corner_count();
    let mut selected = Vec::new();
    let mut index = 0usize;

    while selected.len() < params.max_frames {
        let Some(frame) = source.next_frame()? else {
            debug!("source exhausted after {index} frames");
            break;
        };
        let current = index;
        index += 1;

        if current % params.stride != 0 {
            continue;
        }

        let corners = match detector.detect(&frame, pattern)? {
            Some(corners) if corners.len() == expected => corners,
            Some(corners) => {
                debug!(
                    "frame {current}: partial board ({} of {expected} corners), skipped",
                    corners.len()
                );
                continue;
            }
            None => {
                debug!("frame {current}: no board");
                continue;
            }
        };

        if params.visualize {
            preview.show(&frame, pattern, &corners)?;
        }

        let image_size = frame.image_size()?;
        selected.push(CalibrationFrame {
            source_index: current,
            image: frame,
            image_size,
            corners,
        });
        info!(
            "frame {current}: board found ({}/{})",
            selected.len(),
            params.max_frames
        );
    }

    Ok(selected)
}
