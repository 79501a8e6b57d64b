//! Shared error types for the services crate.

use std::io;

use thiserror::Error;

/// Errors raised while reading frames.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("camera {index} could not be opened")]
    Unavailable { index: i32 },
    #[error("frame capture failed: {0}")]
    Backend(String),
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Errors raised by a hand detector.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DetectorError {
    #[error("detector command is empty")]
    EmptyCommand,
    #[error("detector did not signal ready, got {0:?}")]
    NotReady(String),
    #[error("detector closed its output")]
    Closed,
    #[error("detector stopped answering")]
    Stalled,
    #[error("detector reported: {0}")]
    Reported(String),
    #[error("malformed detector response: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("frame has {len} bytes, expected {expected}")]
    FrameSize { len: usize, expected: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DetectorError {
    /// Errors that only spoil the current frame; the loop keeps going.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DetectorError::Reported(_) | DetectorError::Payload(_) | DetectorError::FrameSize { .. }
        )
    }
}

/// Errors raised by the display surface.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DisplayError {
    #[error("display failed: {0}")]
    Backend(String),
}

/// Errors raised while reading a recorded session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReplayError {
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: t_ms is out of range")]
    Timestamp { line: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors that stop the frame loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoopError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}
