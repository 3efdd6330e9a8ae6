//! OpenCV-backed implementations of the pipeline seams, plus entry points
//! that run the sampler, the solver and the rectifier on a video file.

use std::path::{Path, PathBuf};

use calib_video_core::{
    BoardPattern, CalibError, CalibrationFrame, CalibrationResult, CellSize,
    DistortionCoefficients, ImageSize, IntrinsicMatrix, SolverModel,
};
use nalgebra::{Matrix3, Point2, Point3};
use opencv::core::{
    Mat, Point, Point2f, Point3f, Scalar, Size, TermCriteria, Vector, BORDER_CONSTANT, CV_32FC1,
    TermCriteria_COUNT, TermCriteria_EPS, TermCriteria_MAX_ITER,
};
use opencv::prelude::*;
use opencv::{calib3d, highgui, imgproc, videoio};

use crate::rectifier::{InputEvent, KeyBindings, Undistorter, ViewMode, Viewer};
use crate::sampler::{BoardDetector, DetectionPreview, NoPreview, SamplerParams};
use crate::solver::{BackendCalibration, CalibrationBackend};
use crate::{pipeline, sampler, solver, FrameSource, Raster};

impl Raster for Mat {
    fn image_size(&self) -> Result<ImageSize, CalibError> {
        let size = self.size().map_err(CalibError::backend)?;
        Ok(ImageSize::new(size.width.max(0) as u32, size.height.max(0) as u32))
    }
}

fn cv_size(size: ImageSize) -> Size {
    Size::new(size.width as i32, size.height as i32)
}

fn pattern_size(pattern: BoardPattern) -> Size {
    Size::new(pattern.cols as i32, pattern.rows as i32)
}

/// Video file opened through `videoio`. The capture is released on drop.
pub struct VideoFileSource {
    capture: videoio::VideoCapture,
    path: PathBuf,
}

impl VideoFileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CalibError> {
        let path = path.as_ref().to_path_buf();
        let unavailable = || CalibError::SourceUnavailable { path: path.clone() };
        let name = path.to_str().ok_or_else(unavailable)?;
        let capture =
            videoio::VideoCapture::from_file(name, videoio::CAP_ANY).map_err(|_| unavailable())?;
        if !capture.is_opened().map_err(CalibError::backend)? {
            return Err(unavailable());
        }
        log::debug!("opened {}", path.display());
        Ok(Self { capture, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for VideoFileSource {
    type Frame = Mat;

    fn next_frame(&mut self) -> Result<Option<Mat>, CalibError> {
        let mut frame = Mat::default();
        let ok = self.capture.read(&mut frame).map_err(CalibError::backend)?;
        Ok(ok.then_some(frame))
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        if let Err(err) = self.capture.release() {
            log::warn!("failed to release {}: {err}", self.path.display());
        }
    }
}

/// `findChessboardCornersSB` on a normalized grayscale frame, followed by
/// `cornerSubPix`.
#[derive(Clone, Debug)]
pub struct OpenCvDetector {
    /// Side of the sub-pixel search window.
    pub window: i32,
    pub max_iterations: i32,
    pub epsilon: f64,
}

impl Default for OpenCvDetector {
    fn default() -> Self {
        Self {
            window: 11,
            max_iterations: 30,
            epsilon: 0.001,
        }
    }
}

impl OpenCvDetector {
    fn detect_cv(
        &self,
        frame: &Mat,
        pattern: BoardPattern,
    ) -> opencv::Result<Option<Vec<Point2<f32>>>> {
        let mut gray = Mat::default();
        imgproc::cvt_color_def(frame, &mut gray, imgproc::COLOR_BGR2GRAY)?;

        let mut corners = Vector::<Point2f>::new();
        let found = calib3d::find_chessboard_corners_sb(
            &gray,
            pattern_size(pattern),
            &mut corners,
            calib3d::CALIB_CB_NORMALIZE_IMAGE,
        )?;
        if !found {
            return Ok(None);
        }

        let criteria = TermCriteria::new(
            TermCriteria_EPS + TermCriteria_MAX_ITER,
            self.max_iterations,
            self.epsilon,
        )?;
        imgproc::corner_sub_pix(
            &gray,
            &mut corners,
            Size::new(self.window, self.window),
            Size::new(-1, -1),
            criteria,
        )?;
        Ok(Some(corners.iter().map(|p| Point2::new(p.x, p.y)).collect()))
    }
}

impl BoardDetector<Mat> for OpenCvDetector {
    fn detect(
        &mut self,
        frame: &Mat,
        pattern: BoardPattern,
    ) -> Result<Option<Vec<Point2<f32>>>, CalibError> {
        self.detect_cv(frame, pattern).map_err(CalibError::backend)
    }
}

/// Shows each accepted frame with its corners drawn, for `delay_ms`.
pub struct HighGuiPreview {
    window: String,
    delay_ms: i32,
}

impl Default for HighGuiPreview {
    fn default() -> Self {
        Self {
            window: "Detected Chessboard".to_string(),
            delay_ms: 200,
        }
    }
}

impl HighGuiPreview {
    fn show_cv(
        &self,
        frame: &Mat,
        pattern: BoardPattern,
        corners: &[Point2<f32>],
    ) -> opencv::Result<()> {
        let mut debug_img = frame.try_clone()?;
        let points: Vector<Point2f> = corners.iter().map(|p| Point2f::new(p.x, p.y)).collect();
        calib3d::draw_chessboard_corners(&mut debug_img, pattern_size(pattern), &points, true)?;
        highgui::imshow(&self.window, &debug_img)?;
        highgui::wait_key(self.delay_ms)?;
        Ok(())
    }
}

impl DetectionPreview<Mat> for HighGuiPreview {
    fn show(
        &mut self,
        frame: &Mat,
        pattern: BoardPattern,
        corners: &[Point2<f32>],
    ) -> Result<(), CalibError> {
        self.show_cv(frame, pattern, corners).map_err(CalibError::backend)
    }
}

impl Drop for HighGuiPreview {
    fn drop(&mut self) {
        let _ = highgui::destroy_all_windows();
    }
}

/// `calibrateCamera` with the fixed-term flags derived from [`SolverModel`].
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenCvCalibrator;

fn calib_flags(model: SolverModel) -> i32 {
    let mut flags = 0;
    if model.zero_tangent {
        flags |= calib3d::CALIB_ZERO_TANGENT_DIST;
    }
    if model.fix_k3_to_k6 {
        flags |= calib3d::CALIB_FIX_K3
            | calib3d::CALIB_FIX_K4
            | calib3d::CALIB_FIX_K5
            | calib3d::CALIB_FIX_K6;
    }
    flags
}

impl OpenCvCalibrator {
    fn calibrate_cv(
        &self,
        object_points: &[&[Point3<f32>]],
        image_points: &[&[Point2<f32>]],
        image_size: ImageSize,
        model: SolverModel,
    ) -> opencv::Result<BackendCalibration> {
        let object: Vector<Vector<Point3f>> = object_points
            .iter()
            .map(|view| view.iter().map(|p| Point3f::new(p.x, p.y, p.z)).collect())
            .collect();
        let image: Vector<Vector<Point2f>> = image_points
            .iter()
            .map(|view| view.iter().map(|p| Point2f::new(p.x, p.y)).collect())
            .collect();

        let mut camera_matrix = Mat::default();
        let mut dist_coeffs = Mat::default();
        let mut rvecs = Vector::<Mat>::new();
        let mut tvecs = Vector::<Mat>::new();
        let criteria = TermCriteria::new(TermCriteria_COUNT + TermCriteria_EPS, 30, f64::EPSILON)?;
        let rmse = calib3d::calibrate_camera(
            &object,
            &image,
            cv_size(image_size),
            &mut camera_matrix,
            &mut dist_coeffs,
            &mut rvecs,
            &mut tvecs,
            calib_flags(model),
            criteria,
        )?;

        let mut k = Matrix3::zeros();
        for r in 0..3 {
            for c in 0..3 {
                k[(r, c)] = *camera_matrix.at_2d::<f64>(r as i32, c as i32)?;
            }
        }
        let coefficients = (0..dist_coeffs.total() as i32)
            .map(|i| dist_coeffs.at::<f64>(i).copied())
            .collect::<opencv::Result<Vec<f64>>>()?;

        Ok(BackendCalibration {
            camera_matrix: k,
            coefficients,
            rmse,
        })
    }
}

impl CalibrationBackend for OpenCvCalibrator {
    fn calibrate(
        &mut self,
        object_points: &[&[Point3<f32>]],
        image_points: &[&[Point2<f32>]],
        image_size: ImageSize,
        model: SolverModel,
    ) -> Result<BackendCalibration, CalibError> {
        self.calibrate_cv(object_points, image_points, image_size, model)
            .map_err(CalibError::backend)
    }
}

/// Float remap tables produced by `initUndistortRectifyMap`.
pub struct UndistortMaps {
    map_x: Mat,
    map_y: Mat,
}

/// `initUndistortRectifyMap` + `remap` with linear interpolation.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenCvUndistorter;

impl OpenCvUndistorter {
    fn build_map_cv(
        &self,
        intrinsics: &IntrinsicMatrix,
        distortion: &DistortionCoefficients,
        size: ImageSize,
    ) -> opencv::Result<UndistortMaps> {
        let k = Mat::from_slice_2d(&intrinsics.to_rows())?;
        let dist = Mat::from_slice_2d(&[distortion.as_array()])?;
        let mut map_x = Mat::default();
        let mut map_y = Mat::default();
        // K doubles as the new camera matrix so the output keeps the input framing.
        calib3d::init_undistort_rectify_map(
            &k,
            &dist,
            &Mat::default(),
            &k,
            cv_size(size),
            CV_32FC1,
            &mut map_x,
            &mut map_y,
        )?;
        Ok(UndistortMaps { map_x, map_y })
    }
}

impl Undistorter<Mat> for OpenCvUndistorter {
    type Map = UndistortMaps;

    fn build_map(
        &mut self,
        intrinsics: &IntrinsicMatrix,
        distortion: &DistortionCoefficients,
        size: ImageSize,
    ) -> Result<UndistortMaps, CalibError> {
        self.build_map_cv(intrinsics, distortion, size)
            .map_err(CalibError::backend)
    }

    fn remap(&mut self, frame: &Mat, map: &UndistortMaps) -> Result<Mat, CalibError> {
        let mut out = Mat::default();
        imgproc::remap(
            frame,
            &mut out,
            &map.map_x,
            &map.map_y,
            imgproc::INTER_LINEAR,
            BORDER_CONSTANT,
            Scalar::default(),
        )
        .map_err(CalibError::backend)?;
        Ok(out)
    }
}

/// highgui window with a green mode label; keys polled with `waitKey(1)`.
pub struct HighGuiViewer {
    window: String,
    keys: KeyBindings,
}

impl HighGuiViewer {
    pub fn new(keys: KeyBindings) -> Self {
        Self {
            window: "Distortion Correction".to_string(),
            keys,
        }
    }

    fn present_cv(&self, mut frame: Mat, mode: ViewMode) -> opencv::Result<i32> {
        imgproc::put_text(
            &mut frame,
            mode.label(),
            Point::new(10, 30),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.7,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
            2,
            imgproc::LINE_8,
            false,
        )?;
        highgui::imshow(&self.window, &frame)?;
        highgui::wait_key(1)
    }
}

impl Viewer<Mat> for HighGuiViewer {
    fn present(&mut self, frame: Mat, mode: ViewMode) -> Result<InputEvent, CalibError> {
        let key = self.present_cv(frame, mode).map_err(CalibError::backend)?;
        Ok(self.keys.event_for(key))
    }
}

impl Drop for HighGuiViewer {
    fn drop(&mut self) {
        let _ = highgui::destroy_all_windows();
    }
}

/// Sample board views from a video file with the default stride.
///
/// Fails with [`CalibError::SourceUnavailable`] if the file cannot be opened.
pub fn extract_chessboard_images(
    video: impl AsRef<Path>,
    pattern: BoardPattern,
    max_frames: usize,
    visualize: bool,
) -> Result<Vec<CalibrationFrame<Mat>>, CalibError> {
    let params = SamplerParams {
        max_frames,
        visualize,
        ..SamplerParams::default()
    };
    extract_chessboard_images_with(video, pattern, &params)
}

pub fn extract_chessboard_images_with(
    video: impl AsRef<Path>,
    pattern: BoardPattern,
    params: &SamplerParams,
) -> Result<Vec<CalibrationFrame<Mat>>, CalibError> {
    params.validate()?;
    let mut source = VideoFileSource::open(video)?;
    let mut detector = OpenCvDetector::default();
    if params.visualize {
        let mut preview = HighGuiPreview::default();
        sampler::extract_chessboard_images(&mut source, &mut detector, pattern, params, &mut preview)
    } else {
        sampler::extract_chessboard_images(
            &mut source,
            &mut detector,
            pattern,
            params,
            &mut NoPreview,
        )
    }
}

/// Calibrate with `calibrateCamera` and print the report to stdout.
pub fn calibrate_camera(
    frames: &[CalibrationFrame<Mat>],
    pattern: BoardPattern,
    cell_size: CellSize,
) -> Result<CalibrationResult, CalibError> {
    let result = solver::calibrate_camera(frames, pattern, cell_size, &mut OpenCvCalibrator)?;
    if let Err(err) = solver::print_summary(&result) {
        log::warn!("failed to print calibration summary: {err}");
    }
    Ok(result)
}

/// Sample `video` and calibrate from the accepted views.
///
/// `Ok(None)` means no frame contained the full board; the solver was not run.
pub fn calibrate_video(
    video: impl AsRef<Path>,
    pattern: BoardPattern,
    cell_size: CellSize,
    params: &SamplerParams,
) -> Result<Option<CalibrationResult>, CalibError> {
    params.validate()?;
    let mut source = VideoFileSource::open(video)?;
    let mut detector = OpenCvDetector::default();
    let mut backend = OpenCvCalibrator;
    if params.visualize {
        let mut preview = HighGuiPreview::default();
        pipeline::calibrate_from_source(
            &mut source,
            &mut detector,
            &mut preview,
            &mut backend,
            pattern,
            cell_size,
            params,
        )
    } else {
        pipeline::calibrate_from_source(
            &mut source,
            &mut detector,
            &mut NoPreview,
            &mut backend,
            pattern,
            cell_size,
            params,
        )
    }
}
