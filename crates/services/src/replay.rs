//! Recorded detections played back through the frame loop.
//!
//! One JSON object per line. `t_ms` is the capture offset from the start of
//! the recording; the rest mirrors a detector response:
//!
//! ```text
//! {"t_ms": 0, "hands": [{"handedness": "Right", "score": 0.9, "landmarks": [...]}]}
//! {"t_ms": 33, "empty": true}
//! {"t_ms": 66, "error": "model hiccup"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use finger_core::model::Hand;

use crate::bridge::{DEFAULT_MIN_CONFIDENCE, WireHand, hands_from_wire};
use crate::error::{CaptureError, DetectorError, ReplayError};
use crate::frame_loop::{Captured, FrameRead, FrameSource, HandDetector};

#[derive(Debug, Deserialize)]
struct ReplayLine {
    t_ms: i64,
    #[serde(default)]
    empty: bool,
    #[serde(default)]
    hands: Vec<WireHand>,
    #[serde(default)]
    error: Option<String>,
}

/// One recorded frame: the hands the detector saw, or its error.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayFrame {
    pub line: usize,
    pub hands: Vec<Hand>,
    pub error: Option<String>,
}

pub struct ReplaySource<R> {
    reader: R,
    start: DateTime<Utc>,
    min_confidence: f32,
    line_no: usize,
    buf: String,
}

impl ReplaySource<BufReader<File>> {
    /// # Errors
    ///
    /// Returns `ReplayError::Io` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, start: DateTime<Utc>) -> Result<Self, ReplayError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), start))
    }
}

impl<R: BufRead> ReplaySource<R> {
    /// Frames are stamped `start + t_ms`.
    pub fn new(reader: R, start: DateTime<Utc>) -> Self {
        Self {
            reader,
            start,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            line_no: 0,
            buf: String::new(),
        }
    }

    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    fn read_record(&mut self) -> Result<Option<ReplayLine>, ReplayError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let trimmed = self.buf.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let record = serde_json::from_str(trimmed).map_err(|source| ReplayError::Json {
                line: self.line_no,
                source,
            })?;
            return Ok(Some(record));
        }
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    type Frame = ReplayFrame;

    fn next_frame(&mut self) -> Result<FrameRead<ReplayFrame>, CaptureError> {
        let Some(record) = self.read_record()? else {
            return Ok(FrameRead::Closed);
        };
        if record.empty {
            return Ok(FrameRead::Empty);
        }

        let at = Duration::try_milliseconds(record.t_ms)
            .and_then(|offset| self.start.checked_add_signed(offset))
            .ok_or(ReplayError::Timestamp { line: self.line_no })?;

        Ok(FrameRead::Frame(Captured {
            frame: ReplayFrame {
                line: self.line_no,
                hands: hands_from_wire(record.hands, self.min_confidence),
                error: record.error,
            },
            at,
        }))
    }
}

/// Hands back whatever the recording says the detector saw.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayDetector;

impl HandDetector for ReplayDetector {
    type Frame = ReplayFrame;

    fn detect(&mut self, frame: &ReplayFrame) -> Result<Vec<Hand>, DetectorError> {
        match &frame.error {
            Some(message) => Err(DetectorError::Reported(message.clone())),
            None => Ok(frame.hands.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use finger_core::time::fixed_now;

    use super::*;

    #[test]
    fn reads_frames_empties_and_close() {
        let input = "# recorded\n{\"t_ms\": 0}\n\n{\"t_ms\": 40, \"empty\": true}\n{\"t_ms\": 80, \"error\": \"boom\"}\n";
        let mut source = ReplaySource::new(Cursor::new(input), fixed_now());

        let FrameRead::Frame(first) = source.next_frame().unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(first.at, fixed_now());
        assert_eq!(first.frame.line, 2);
        assert!(first.frame.hands.is_empty());

        assert_eq!(source.next_frame().unwrap(), FrameRead::Empty);

        let FrameRead::Frame(third) = source.next_frame().unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(third.at, fixed_now() + Duration::milliseconds(80));
        let err = ReplayDetector.detect(&third.frame).unwrap_err();
        assert!(err.is_transient());

        assert_eq!(source.next_frame().unwrap(), FrameRead::Closed);
    }

    #[test]
    fn bad_json_reports_line_number() {
        let mut source = ReplaySource::new(Cursor::new("{\"t_ms\": 0}\n{oops\n"), fixed_now());
        assert!(matches!(source.next_frame(), Ok(FrameRead::Frame(_))));

        let err = source.next_frame().unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Replay(ReplayError::Json { line: 2, .. })
        ));
    }

    #[test]
    fn out_of_range_offset_is_an_error() {
        let input = "{\"t_ms\": 10}\n{\"t_ms\": 9223372036854775807}\n";
        let mut source = ReplaySource::new(Cursor::new(input), fixed_now());
        assert!(matches!(source.next_frame(), Ok(FrameRead::Frame(_))));

        let err = source.next_frame().unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Replay(ReplayError::Timestamp { line: 2 })
        ));
    }
}
