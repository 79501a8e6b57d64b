use std::collections::VecDeque;

use chrono::Duration;
use finger_core::model::{Finger, Hand, LANDMARK_COUNT, Landmark, Question, ScriptedQuestions};
use finger_core::quiz::{Overlay, QuizConfig, QuizSession};
use finger_core::time::fixed_clock;
use services::{
    CaptureError, Captured, Clock, Control, DetectorError, DisplayError, FrameLoop, FrameRead,
    FrameSink, FrameSource, HandDetector, LoopError, LoopOptions,
};

/// A hand with the first `raised` fingers extended.
fn hand_with(raised: usize) -> Hand {
    let mut points = [Landmark::planar(0.5, 0.5); LANDMARK_COUNT];
    for (i, finger) in Finger::ALL.into_iter().enumerate() {
        points[finger.tip()] = match (finger, i < raised) {
            (Finger::Thumb, true) => Landmark::planar(0.4, 0.6),
            (Finger::Thumb, false) => Landmark::planar(0.6, 0.6),
            (_, true) => Landmark::planar(0.5, 0.4),
            (_, false) => Landmark::planar(0.5, 0.6),
        };
    }
    Hand::new(points)
}

enum Scripted {
    Hands(Vec<Hand>),
    Empty,
    DetectorHiccup,
    DetectorDown,
}

/// Emits one scripted frame per tick, `interval` apart.
struct ScriptedCamera {
    clock: Clock,
    interval: Duration,
    frames: VecDeque<Scripted>,
}

impl ScriptedCamera {
    fn new(interval_ms: i64, frames: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            clock: fixed_clock(),
            interval: Duration::milliseconds(interval_ms),
            frames: frames.into_iter().collect(),
        }
    }
}

impl FrameSource for ScriptedCamera {
    type Frame = Scripted;

    fn next_frame(&mut self) -> Result<FrameRead<Scripted>, CaptureError> {
        let Some(frame) = self.frames.pop_front() else {
            return Ok(FrameRead::Closed);
        };
        let at = self.clock.now();
        self.clock.advance(self.interval);
        if matches!(frame, Scripted::Empty) {
            return Ok(FrameRead::Empty);
        }
        Ok(FrameRead::Frame(Captured { frame, at }))
    }
}

struct ScriptedDetector;

impl HandDetector for ScriptedDetector {
    type Frame = Scripted;

    fn detect(&mut self, frame: &Scripted) -> Result<Vec<Hand>, DetectorError> {
        match frame {
            Scripted::Hands(hands) => Ok(hands.clone()),
            Scripted::Empty => Ok(Vec::new()),
            Scripted::DetectorHiccup => Err(DetectorError::Reported("hiccup".into())),
            Scripted::DetectorDown => Err(DetectorError::Closed),
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    overlays: Vec<Overlay>,
    quit_after: Option<usize>,
}

impl FrameSink for &mut RecordingSink {
    type Frame = Scripted;

    fn present(
        &mut self,
        _frame: Scripted,
        _hands: &[Hand],
        overlay: &Overlay,
    ) -> Result<Control, DisplayError> {
        self.overlays.push(overlay.clone());
        if self.quit_after == Some(self.overlays.len()) {
            return Ok(Control::Quit);
        }
        Ok(Control::Continue)
    }
}

fn session() -> QuizSession<ScriptedQuestions> {
    let script = ScriptedQuestions::new(vec![Question::addition(4, 3), Question::addition(1, 1)])
        .unwrap();
    QuizSession::new(QuizConfig::default(), script)
}

fn seven() -> Scripted {
    Scripted::Hands(vec![hand_with(5), hand_with(2)])
}

#[test]
fn holding_seven_fingers_answers_the_question() {
    // 100 ms per frame: confirmed at 3.0 s, advanced at 4.5 s.
    let frames = (0..=45).map(|_| seven());
    let mut sink = RecordingSink::default();

    let summary = FrameLoop::new(
        ScriptedCamera::new(100, frames),
        ScriptedDetector,
        &mut sink,
        session(),
    )
    .run()
    .unwrap();

    assert_eq!(summary.frames, 46);
    assert_eq!(summary.solved, 1);

    let first_correct = sink.overlays.iter().position(|o| o.show_correct).unwrap();
    assert_eq!(first_correct, 30);
    let advanced: Vec<usize> = sink
        .overlays
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.advanced.then_some(i))
        .collect();
    assert_eq!(advanced, vec![45]);
    assert!(sink.overlays.iter().all(|o| o.total_fingers == 7));
    assert!(sink.overlays.iter().all(|o| o.prompt == "4 + 3 = ?"));
}

#[test]
fn empty_frames_and_detector_hiccups_are_skipped() {
    let frames = vec![
        seven(),
        Scripted::Empty,
        Scripted::DetectorHiccup,
        seven(),
        Scripted::Empty,
    ];
    let mut sink = RecordingSink::default();

    let summary = FrameLoop::new(
        ScriptedCamera::new(100, frames),
        ScriptedDetector,
        &mut sink,
        session(),
    )
    .run()
    .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.empty_frames, 2);
    // The hiccup frame counts as zero fingers.
    let totals: Vec<u32> = sink.overlays.iter().map(|o| o.total_fingers).collect();
    assert_eq!(totals, vec![7, 0, 7]);
}

#[test]
fn extra_hands_beyond_the_cap_are_ignored() {
    let frames = vec![Scripted::Hands(vec![hand_with(5), hand_with(2), hand_with(3)])];
    let mut sink = RecordingSink::default();

    FrameLoop::new(
        ScriptedCamera::new(100, frames),
        ScriptedDetector,
        &mut sink,
        session(),
    )
    .with_options(LoopOptions::default())
    .run()
    .unwrap();

    assert_eq!(sink.overlays[0].total_fingers, 7);
}

#[test]
fn quit_stops_the_loop_early() {
    let frames = (0..10).map(|_| seven());
    let mut sink = RecordingSink {
        quit_after: Some(3),
        ..RecordingSink::default()
    };

    let summary = FrameLoop::new(
        ScriptedCamera::new(100, frames),
        ScriptedDetector,
        &mut sink,
        session(),
    )
    .run()
    .unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(sink.overlays.len(), 3);
}

#[test]
fn detector_failure_stops_the_loop() {
    let frames = vec![seven(), Scripted::DetectorDown, seven()];
    let mut sink = RecordingSink::default();

    let err = FrameLoop::new(
        ScriptedCamera::new(100, frames),
        ScriptedDetector,
        &mut sink,
        session(),
    )
    .run()
    .unwrap_err();

    assert!(matches!(err, LoopError::Detector(DetectorError::Closed)));
    assert_eq!(sink.overlays.len(), 1);
}
