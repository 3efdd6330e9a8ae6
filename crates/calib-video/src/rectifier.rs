//! Live rectification: an original/rectified view toggle over a video
//! source, with the undistortion map built once per frame size.

use std::path::PathBuf;

use calib_video_core::{
    CalibError, CalibrationResult, DistortionCoefficients, ImageSize, IntrinsicMatrix,
    UndistortionCache,
};
use log::{debug, info};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::{FrameSource, Raster};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Which version of the frame is displayed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewMode {
    Original,
    #[default]
    Rectified,
}

impl ViewMode {
    /// Overlay text for the displayed frame.
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Original => "Original",
            ViewMode::Rectified => "Rectified (Undistorted)",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Original => ViewMode::Rectified,
            ViewMode::Rectified => ViewMode::Original,
        }
    }

    pub fn apply(self, event: InputEvent) -> Transition {
        match event {
            InputEvent::None => Transition::Continue(self),
            InputEvent::Toggle => Transition::Continue(self.toggled()),
            InputEvent::Quit => Transition::Quit,
        }
    }
}

/// Input polled after each displayed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    None,
    Toggle,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Continue(ViewMode),
    Quit,
}

/// Key codes as returned by a `waitKey`-style poll (`-1` = no key).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub toggle: i32,
    pub quit: i32,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle: 'r' as i32,
            quit: 27,
        }
    }
}

impl KeyBindings {
    pub fn event_for(&self, key: i32) -> InputEvent {
        // highgui may report modifier bits above the low byte
        let key = if key < 0 { key } else { key & 0xff };
        if key == self.quit {
            InputEvent::Quit
        } else if key == self.toggle {
            InputEvent::Toggle
        } else {
            InputEvent::None
        }
    }
}

/// Fixed camera model and inputs for the rectifier loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectifierConfig {
    pub video: PathBuf,
    pub intrinsics: IntrinsicMatrix,
    pub distortion: DistortionCoefficients,
    #[serde(default)]
    pub keys: KeyBindings,
    #[serde(default)]
    pub initial_mode: ViewMode,
}

impl Default for RectifierConfig {
    fn default() -> Self {
        Self {
            video: PathBuf::from("chessboard.mp4"),
            intrinsics: default_intrinsics(),
            distortion: DistortionCoefficients::radial(-0.167291, 0.543998),
            keys: KeyBindings::default(),
            initial_mode: ViewMode::Rectified,
        }
    }
}

impl RectifierConfig {
    /// Hand a calibration result over to the rectifier.
    pub fn from_calibration(result: &CalibrationResult, video: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            intrinsics: result.intrinsics,
            distortion: result.distortion,
            ..Self::default()
        }
    }
}

fn default_intrinsics() -> IntrinsicMatrix {
    let k = Matrix3::new(
        1972.3442, 0.0, 1042.9267, //
        0.0, 1920.0901, 296.8256, //
        0.0, 0.0, 1.0,
    );
    match IntrinsicMatrix::from_matrix(k) {
        Ok(k) => k,
        Err(_) => unreachable!("literal focal lengths are positive"),
    }
}

/// Map generation and resampling.
pub trait Undistorter<F> {
    type Map;

    /// Build the per-pixel source lookup for `size`, with identity
    /// rectification and `intrinsics` reused as the target matrix so the
    /// output keeps the original framing.
    fn build_map(
        &mut self,
        intrinsics: &IntrinsicMatrix,
        distortion: &DistortionCoefficients,
        size: ImageSize,
    ) -> Result<Self::Map, CalibError>;

    /// Resample `frame` through `map` with linear interpolation.
    fn remap(&mut self, frame: &F, map: &Self::Map) -> Result<F, CalibError>;
}

/// Display surface plus input poll.
pub trait Viewer<F> {
    /// Draw `mode.label()` onto `frame`, show it and return the input
    /// received while it was on screen.
    fn present(&mut self, frame: F, mode: ViewMode) -> Result<InputEvent, CalibError>;
}

/// What the loop did before it stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RectifierStats {
    pub original_frames: usize,
    pub rectified_frames: usize,
    pub map_builds: usize,
    /// `true` if the loop ended on a quit event rather than source exhaustion.
    pub quit: bool,
}

impl RectifierStats {
    fn record(&mut self, mode: ViewMode) {
        match mode {
            ViewMode::Original => self.original_frames += 1,
            ViewMode::Rectified => self.rectified_frames += 1,
        }
    }
}

/// Play `source` until it is exhausted or a quit event arrives.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(source, undistorter, viewer, config))
)]
pub fn run_rectifier<S, U, V>(
    source: &mut S,
    undistorter: &mut U,
    viewer: &mut V,
    config: &RectifierConfig,
) -> Result<RectifierStats, CalibError>
where
    S: FrameSource,
    U: Undistorter<S::Frame>,
    V: Viewer<S::Frame>,
{
    let mut cache = UndistortionCache::new();
    let mut mode = config.initial_mode;
    let mut stats = RectifierStats::default();

    while let Some(frame) = source.next_frame()? {
        let shown = match mode {
            ViewMode::Rectified => {
                let size = frame.image_size()?;
                let map = cache.get_or_try_insert_with(size, |size| {
                    undistorter.build_map(&config.intrinsics, &config.distortion, size)
                })?;
                undistorter.remap(&frame, map)?
            }
            ViewMode::Original => frame,
        };
        stats.record(mode);

        match mode.apply(viewer.present(shown, mode)?) {
            Transition::Continue(next) => {
                if next != mode {
                    debug!("view mode: {}", next.label());
                }
                mode = next;
            }
            Transition::Quit => {
                stats.quit = true;
                break;
            }
        }
    }

    stats.map_builds = cache.builds();
    info!(
        "rectifier stopped: {} original, {} rectified frame(s)",
        stats.original_frames, stats.rectified_frames
    );
    Ok(stats)
}
