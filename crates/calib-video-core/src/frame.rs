use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One accepted video frame with its refined board corners.
///
/// `corners` holds exactly `cols * rows` points in detector order.
#[derive(Clone, Debug)]
pub struct CalibrationFrame<F> {
    /// Index of the frame in the source video.
    pub source_index: usize,
    pub image: F,
    pub image_size: ImageSize,
    pub corners: Vec<Point2<f32>>,
}
