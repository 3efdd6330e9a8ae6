#![allow(dead_code)]

use std::collections::VecDeque;

use calib_video::core::{BoardPattern, CalibError, CalibrationFrame, ImageSize, SolverModel};
use calib_video::rectifier::{InputEvent, Undistorter, ViewMode, Viewer};
use calib_video::sampler::{BoardDetector, DetectionPreview};
use calib_video::solver::{BackendCalibration, CalibrationBackend};
use calib_video::{DistortionCoefficients, IntrinsicMatrix, Raster};
use nalgebra::{Matrix3, Point2, Point3};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const VGA: ImageSize = ImageSize {
    width: 640,
    height: 480,
};

/// Stand-in for a decoded frame.
#[derive(Clone, Debug, PartialEq)]
pub struct StubFrame {
    pub id: usize,
    pub size: ImageSize,
    pub rectified: bool,
}

impl Raster for StubFrame {
    fn image_size(&self) -> Result<ImageSize, CalibError> {
        Ok(self.size)
    }
}

pub fn stub_frames(count: usize, size: ImageSize) -> Vec<StubFrame> {
    (0..count)
        .map(|id| StubFrame {
            id,
            size,
            rectified: false,
        })
        .collect()
}

/// Evenly spaced corner grid, as a clean board image would produce.
pub fn grid_corners(pattern: BoardPattern, count: usize) -> Vec<Point2<f32>> {
    (0..count)
        .map(|i| {
            let c = (i % pattern.cols as usize) as f32;
            let r = (i / pattern.cols as usize) as f32;
            Point2::new(100.0 + 20.0 * c, 80.0 + 20.0 * r)
        })
        .collect()
}

/// Detector whose outcome per frame is decided by `corners_for(frame_id)`:
/// `Some(n)` reports `n` corners, `None` reports a miss.
pub struct ScriptedDetector<F: Fn(usize) -> Option<usize>> {
    pub corners_for: F,
    pub seen: Vec<usize>,
}

impl<F: Fn(usize) -> Option<usize>> ScriptedDetector<F> {
    pub fn new(corners_for: F) -> Self {
        Self {
            corners_for,
            seen: Vec::new(),
        }
    }
}

impl<F: Fn(usize) -> Option<usize>> BoardDetector<StubFrame> for ScriptedDetector<F> {
    fn detect(
        &mut self,
        frame: &StubFrame,
        pattern: BoardPattern,
    ) -> Result<Option<Vec<Point2<f32>>>, CalibError> {
        self.seen.push(frame.id);
        Ok((self.corners_for)(frame.id).map(|n| grid_corners(pattern, n)))
    }
}

#[derive(Default)]
pub struct RecordingPreview {
    pub shown: Vec<usize>,
}

impl DetectionPreview<StubFrame> for RecordingPreview {
    fn show(
        &mut self,
        frame: &StubFrame,
        pattern: BoardPattern,
        corners: &[Point2<f32>],
    ) -> Result<(), CalibError> {
        assert_eq!(corners.len(), pattern.corner_count());
        self.shown.push(frame.id);
        Ok(())
    }
}

pub fn calibration_frames(count: usize, pattern: BoardPattern) -> Vec<CalibrationFrame<StubFrame>> {
    stub_frames(count, VGA)
        .into_iter()
        .map(|image| CalibrationFrame {
            source_index: image.id * 5,
            image_size: image.size,
            corners: grid_corners(pattern, pattern.corner_count()),
            image,
        })
        .collect()
}

/// Backend that records what it was given and answers with a fixed result.
pub struct CountingBackend {
    pub calls: usize,
    pub views: usize,
    pub shared_template: bool,
    pub first_view: Vec<Point3<f32>>,
    pub image_size: Option<ImageSize>,
    pub model: Option<SolverModel>,
    pub answer: BackendCalibration,
}

impl CountingBackend {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self {
            calls: 0,
            views: 0,
            shared_template: false,
            first_view: Vec::new(),
            image_size: None,
            model: None,
            answer: BackendCalibration {
                camera_matrix: Matrix3::new(
                    800.0, 0.0, 320.0, //
                    0.0, 790.0, 240.0, //
                    0.0, 0.0, 1.0,
                ),
                coefficients,
                rmse: 0.25,
            },
        }
    }
}

impl CalibrationBackend for CountingBackend {
    fn calibrate(
        &mut self,
        object_points: &[&[Point3<f32>]],
        image_points: &[&[Point2<f32>]],
        image_size: ImageSize,
        model: SolverModel,
    ) -> Result<BackendCalibration, CalibError> {
        assert_eq!(object_points.len(), image_points.len());
        self.calls += 1;
        self.views = object_points.len();
        self.shared_template = object_points
            .windows(2)
            .all(|w| std::ptr::eq(w[0].as_ptr(), w[1].as_ptr()));
        self.first_view = object_points.first().map(|v| v.to_vec()).unwrap_or_default();
        self.image_size = Some(image_size);
        self.model = Some(model);
        Ok(self.answer.clone())
    }
}

/// Undistorter that counts map builds and tags remapped frames.
#[derive(Default)]
pub struct CountingUndistorter {
    pub builds: usize,
    pub remaps: usize,
}

impl Undistorter<StubFrame> for CountingUndistorter {
    type Map = ImageSize;

    fn build_map(
        &mut self,
        intrinsics: &IntrinsicMatrix,
        distortion: &DistortionCoefficients,
        size: ImageSize,
    ) -> Result<ImageSize, CalibError> {
        assert!(intrinsics.fx() > 0.0);
        assert_eq!(distortion.as_array()[2..], [0.0, 0.0, 0.0]);
        self.builds += 1;
        Ok(size)
    }

    fn remap(&mut self, frame: &StubFrame, map: &ImageSize) -> Result<StubFrame, CalibError> {
        assert_eq!(frame.size, *map, "map reused for a different frame size");
        self.remaps += 1;
        Ok(StubFrame {
            rectified: true,
            ..frame.clone()
        })
    }
}

/// Viewer that replays a script of input events, one per presented frame,
/// then reports no input.
pub struct ScriptedViewer {
    pub events: VecDeque<InputEvent>,
    pub presented: Vec<(usize, ViewMode, bool)>,
}

impl ScriptedViewer {
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            presented: Vec::new(),
        }
    }

    pub fn modes(&self) -> Vec<ViewMode> {
        self.presented.iter().map(|(_, mode, _)| *mode).collect()
    }
}

impl Viewer<StubFrame> for ScriptedViewer {
    fn present(&mut self, frame: StubFrame, mode: ViewMode) -> Result<InputEvent, CalibError> {
        self.presented.push((frame.id, mode, frame.rectified));
        Ok(self.events.pop_front().unwrap_or(InputEvent::None))
    }
}
