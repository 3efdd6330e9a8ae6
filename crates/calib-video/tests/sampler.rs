mod common;

use calib_video::core::{BoardPattern, CalibError, ImageSize};
use calib_video::sampler::{extract_chessboard_images, NoPreview, SamplerParams};
use calib_video::{FrameIter, FrameSource, Raster};
use common::{init_logging, stub_frames, RecordingPreview, ScriptedDetector, StubFrame, VGA};

fn board() -> BoardPattern {
    BoardPattern::new(10, 7).unwrap()
}

#[test]
fn identical_clean_frames_are_sampled_at_stride() {
    init_logging();
    let pattern = board();
    let mut source = FrameIter::new(stub_frames(10, VGA));
    let mut detector = ScriptedDetector::new(|_| Some(70));

    let frames = extract_chessboard_images(
        &mut source,
        &mut detector,
        pattern,
        &SamplerParams::default(),
        &mut NoPreview,
    )
    .unwrap();

    let indices: Vec<usize> = frames.iter().map(|f| f.source_index).collect();
    assert_eq!(indices, vec![0, 5]);
    assert_eq!(detector.seen, vec![0, 5]);
    for frame in &frames {
        assert_eq!(frame.corners.len(), pattern.corner_count());
        assert_eq!(frame.image_size, VGA);
        assert_eq!(frame.image.id, frame.source_index);
    }
}

#[test]
fn never_collects_more_than_max_frames() {
    let pattern = board();
    let mut source = FrameIter::new(stub_frames(100, VGA));
    let mut detector = ScriptedDetector::new(|_| Some(70));
    let params = SamplerParams {
        max_frames: 3,
        stride: 2,
        visualize: false,
    };

    let frames =
        extract_chessboard_images(&mut source, &mut detector, pattern, &params, &mut NoPreview)
            .unwrap();

    assert_eq!(frames.len(), 3);
    assert_eq!(detector.seen, vec![0, 2, 4]);
    // Reading stops once the cap is reached.
    assert_eq!(source.next_frame().unwrap().map(|f| f.id), Some(5));
}

#[test]
fn only_stride_multiples_reach_the_detector() {
    let pattern = board();
    let mut source = FrameIter::new(stub_frames(23, VGA));
    let mut detector = ScriptedDetector::new(|_| None);
    let params = SamplerParams {
        stride: 3,
        ..SamplerParams::default()
    };

    let frames =
        extract_chessboard_images(&mut source, &mut detector, pattern, &params, &mut NoPreview)
            .unwrap();

    assert!(frames.is_empty());
    assert!(detector.seen.iter().all(|i| i % 3 == 0));
    assert_eq!(detector.seen.len(), 8);
}

#[test]
fn partial_detections_are_rejected() {
    let pattern = board();
    let mut source = FrameIter::new(stub_frames(20, VGA));
    // Frame 5 sees only part of the board.
    let mut detector = ScriptedDetector::new(|id| if id == 5 { Some(42) } else { Some(70) });

    let frames = extract_chessboard_images(
        &mut source,
        &mut detector,
        pattern,
        &SamplerParams::default(),
        &mut NoPreview,
    )
    .unwrap();

    let indices: Vec<usize> = frames.iter().map(|f| f.source_index).collect();
    assert_eq!(indices, vec![0, 10, 15]);
    assert!(frames
        .iter()
        .all(|f| f.corners.len() == pattern.corner_count()));
}

#[test]
fn misses_are_skipped_without_retry() {
    let pattern = board();
    let mut source = FrameIter::new(stub_frames(30, VGA));
    let mut detector = ScriptedDetector::new(|id| (id % 10 == 0).then_some(70));

    let frames = extract_chessboard_images(
        &mut source,
        &mut detector,
        pattern,
        &SamplerParams::default(),
        &mut NoPreview,
    )
    .unwrap();

    assert_eq!(frames.len(), 3);
    assert_eq!(detector.seen, vec![0, 5, 10, 15, 20, 25]);
}

#[test]
fn preview_sees_accepted_frames_only_when_enabled() {
    let pattern = board();
    let script = |id: usize| (id != 5).then_some(70);

    let mut preview = RecordingPreview::default();
    let visual = SamplerParams {
        visualize: true,
        ..SamplerParams::default()
    };
    let shown = extract_chessboard_images(
        &mut FrameIter::new(stub_frames(16, VGA)),
        &mut ScriptedDetector::new(script),
        pattern,
        &visual,
        &mut preview,
    )
    .unwrap();
    assert_eq!(preview.shown, vec![0, 10, 15]);

    let mut silent = RecordingPreview::default();
    let hidden = extract_chessboard_images(
        &mut FrameIter::new(stub_frames(16, VGA)),
        &mut ScriptedDetector::new(script),
        pattern,
        &SamplerParams::default(),
        &mut silent,
    )
    .unwrap();
    assert!(silent.shown.is_empty());

    let a: Vec<usize> = shown.iter().map(|f| f.source_index).collect();
    let b: Vec<usize> = hidden.iter().map(|f| f.source_index).collect();
    assert_eq!(a, b);
}

#[test]
fn invalid_params_fail_before_reading() {
    let mut source = FrameIter::new(stub_frames(5, VGA));
    let mut detector = ScriptedDetector::new(|_| Some(70));
    let params = SamplerParams {
        max_frames: 0,
        ..SamplerParams::default()
    };

    let err =
        extract_chessboard_images(&mut source, &mut detector, board(), &params, &mut NoPreview)
            .unwrap_err();
    assert!(matches!(err, CalibError::InvalidSamplerParams(_)));
    assert!(detector.seen.is_empty());
    assert_eq!(source.next_frame().unwrap().map(|f| f.id), Some(0));
}

struct FailingSource {
    served: usize,
}

impl FrameSource for FailingSource {
    type Frame = StubFrame;

    fn next_frame(&mut self) -> Result<Option<StubFrame>, CalibError> {
        if self.served == 2 {
            return Err(CalibError::backend(std::io::Error::other("decoder died")));
        }
        self.served += 1;
        Ok(Some(StubFrame {
            id: self.served - 1,
            size: ImageSize::new(32, 32),
            rectified: false,
        }))
    }
}

#[test]
fn source_errors_propagate_unchanged() {
    let mut detector = ScriptedDetector::new(|_| Some(70));
    let err = extract_chessboard_images(
        &mut FailingSource { served: 0 },
        &mut detector,
        board(),
        &SamplerParams::default(),
        &mut NoPreview,
    )
    .unwrap_err();

    let CalibError::Backend(inner) = err else {
        panic!("expected a backend error, got {err:?}");
    };
    assert_eq!(inner.to_string(), "decoder died");
}

#[test]
fn stub_frames_report_their_size() {
    let frame = &stub_frames(1, VGA)[0];
    assert_eq!(frame.image_size().unwrap(), VGA);
}
