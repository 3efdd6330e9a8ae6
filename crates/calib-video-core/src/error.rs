use std::path::PathBuf;

use crate::ImageSize;

/// Errors produced by the calibration workflow.
///
/// Detection misses are not errors: a frame without a board is skipped by
/// the sampler.
#[derive(thiserror::Error, Debug)]
pub enum CalibError {
    #[error("cannot open video source: {}", path.display())]
    SourceUnavailable { path: PathBuf },

    #[error("no chessboard data provided for calibration")]
    EmptyDataset,

    #[error("invalid board pattern {cols}x{rows} (both dimensions must be >= 1)")]
    InvalidBoardPattern { cols: u32, rows: u32 },

    #[error("invalid cell size {0} (must be finite and > 0)")]
    InvalidCellSize(f32),

    #[error("invalid intrinsics (fx={fx}, fy={fy}); focal lengths must be > 0")]
    InvalidIntrinsics { fx: f64, fy: f64 },

    #[error("invalid sampler parameters: {0}")]
    InvalidSamplerParams(&'static str),

    #[error("frame {index} has size {got}, expected {expected}")]
    ImageSizeMismatch {
        index: usize,
        expected: ImageSize,
        got: ImageSize,
    },

    #[error("frame {index} has {got} corners, expected {expected}")]
    CornerCountMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    /// Failure reported by the underlying vision library, passed through as-is.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl CalibError {
    /// Wrap a vision-library error without translating it.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}
