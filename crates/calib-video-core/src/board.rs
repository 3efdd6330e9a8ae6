use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::CalibError;

/// Checkerboard geometry as a count of *internal* corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardPattern {
    pub cols: u32,
    pub rows: u32,
}

impl BoardPattern {
    pub fn new(cols: u32, rows: u32) -> Result<Self, CalibError> {
        if cols == 0 || rows == 0 {
            return Err(CalibError::InvalidBoardPattern { cols, rows });
        }
        Ok(Self { cols, rows })
    }

    /// Number of corners a complete detection must contain.
    pub fn corner_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Physical edge length of one board square, in caller-chosen units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct CellSize(f32);

impl CellSize {
    pub fn new(size: f32) -> Result<Self, CalibError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(CalibError::InvalidCellSize(size));
        }
        Ok(Self(size))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl TryFrom<f32> for CellSize {
    type Error = CalibError;

    fn try_from(size: f32) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<CellSize> for f32 {
    fn from(size: CellSize) -> Self {
        size.0
    }
}

/// Board corners on the board plane (z = 0), scaled by `cell`.
///
/// Row-major with the column index varying fastest, i.e. index
/// `r * cols + c` maps to `(c * cell, r * cell, 0)`. This is the order in
/// which chessboard detectors report corners.
pub fn object_points(pattern: BoardPattern, cell: CellSize) -> Vec<Point3<f32>> {
    let s = cell.get();
    (0..pattern.rows)
        .flat_map(|r| (0..pattern.cols).map(move |c| Point3::new(c as f32 * s, r as f32 * s, 0.0)))
        .collect()
}
