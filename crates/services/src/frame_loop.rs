//! The per-frame control loop.
//!
//! `FrameLoop` pulls a frame, asks the detector for hands, counts fingers,
//! advances the quiz and hands the overlay to the display. Collaborators are
//! owned by the loop and dropped with it, on success or error.

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};

use finger_core::counter::{ThumbRule, total_fingers_with};
use finger_core::model::{Hand, QuestionSource};
use finger_core::quiz::{Overlay, QuizSession};

use crate::error::{CaptureError, DetectorError, DisplayError, LoopError};

/// Most hands counted per frame.
pub const DEFAULT_MAX_HANDS: usize = 2;

//
// ─── COLLABORATORS ────────────────────────────────────────────────────────────
//

/// A frame with the instant it was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct Captured<F> {
    pub frame: F,
    pub at: DateTime<Utc>,
}

/// Outcome of one read from a frame source.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameRead<F> {
    Frame(Captured<F>),
    /// Nothing usable this time; try again.
    Empty,
    /// The source is exhausted or the device went away.
    Closed,
}

/// Whether the loop should keep going after a frame is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub trait FrameSource {
    type Frame;

    /// # Errors
    ///
    /// Returns `CaptureError` when the source fails in a way retrying won't fix.
    fn next_frame(&mut self) -> Result<FrameRead<Self::Frame>, CaptureError>;
}

pub trait HandDetector {
    type Frame;

    /// # Errors
    ///
    /// Returns `DetectorError`; see [`DetectorError::is_transient`].
    fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<Hand>, DetectorError>;
}

pub trait FrameSink {
    type Frame;

    /// # Errors
    ///
    /// Returns `DisplayError` if the frame cannot be shown.
    fn present(
        &mut self,
        frame: Self::Frame,
        hands: &[Hand],
        overlay: &Overlay,
    ) -> Result<Control, DisplayError>;
}

//
// ─── LOOP ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    pub max_hands: usize,
    pub thumb_rule: ThumbRule,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            max_hands: DEFAULT_MAX_HANDS,
            thumb_rule: ThumbRule::default(),
        }
    }
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub empty_frames: u64,
    pub solved: u32,
}

/// Result of a single [`FrameLoop::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Presented { overlay: Overlay, control: Control },
    Empty,
    Closed,
}

pub struct FrameLoop<S, D, K, Q> {
    source: S,
    detector: D,
    sink: K,
    session: QuizSession<Q>,
    options: LoopOptions,
    summary: LoopSummary,
}

impl<S, D, K, Q> FrameLoop<S, D, K, Q>
where
    S: FrameSource,
    D: HandDetector<Frame = S::Frame>,
    K: FrameSink<Frame = S::Frame>,
    Q: QuestionSource,
{
    #[must_use]
    pub fn new(source: S, detector: D, sink: K, session: QuizSession<Q>) -> Self {
        Self {
            source,
            detector,
            sink,
            session,
            options: LoopOptions::default(),
            summary: LoopSummary::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: LoopOptions) -> Self {
        self.options = options;
        self
    }

    /// Processes at most one frame.
    ///
    /// # Errors
    ///
    /// Returns `LoopError` for capture, non-transient detector, or display failures.
    pub fn step(&mut self) -> Result<Tick, LoopError> {
        let captured = match self.source.next_frame()? {
            FrameRead::Frame(captured) => captured,
            FrameRead::Empty => {
                self.summary.empty_frames += 1;
                debug!("ignoring empty camera frame");
                return Ok(Tick::Empty);
            }
            FrameRead::Closed => return Ok(Tick::Closed),
        };
        self.summary.frames += 1;

        let hands = self.detect_hands(&captured.frame)?;
        let total = total_fingers_with(&hands, self.options.thumb_rule);
        let overlay = self.session.update(total, captured.at);
        trace!(hands = hands.len(), total, state = ?self.session.state(), "frame judged");

        if overlay.advanced {
            self.summary.solved = self.session.solved();
            info!(
                answered = %overlay.prompt,
                next = %self.session.question(),
                solved = self.summary.solved,
                "question answered"
            );
        }

        let control = self.sink.present(captured.frame, &hands, &overlay)?;
        Ok(Tick::Presented { overlay, control })
    }

    /// Runs until the source closes or the display asks to quit.
    ///
    /// # Errors
    ///
    /// Returns the first `LoopError` raised by [`FrameLoop::step`].
    pub fn run(mut self) -> Result<LoopSummary, LoopError> {
        info!(question = %self.session.question(), "quiz started");
        loop {
            match self.step()? {
                Tick::Presented {
                    control: Control::Quit,
                    ..
                } => {
                    info!("quit requested");
                    break;
                }
                Tick::Closed => {
                    info!("frame source closed");
                    break;
                }
                Tick::Presented { .. } | Tick::Empty => {}
            }
        }
        Ok(self.summary)
    }

    fn detect_hands(&mut self, frame: &S::Frame) -> Result<Vec<Hand>, DetectorError> {
        let mut hands = match self.detector.detect(frame) {
            Ok(hands) => hands,
            Err(err) if err.is_transient() => {
                warn!(error = %err, "detection failed, counting no hands");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        hands.truncate(self.options.max_hands);
        Ok(hands)
    }
}
