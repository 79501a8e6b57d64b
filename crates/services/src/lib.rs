#![forbid(unsafe_code)]

pub mod bridge;
pub mod error;
pub mod frame_loop;
pub mod questions;
pub mod replay;

pub use finger_core::Clock;

pub use error::{CaptureError, DetectorError, DisplayError, LoopError, ReplayError};
pub use frame_loop::{
    Captured, Control, FrameLoop, FrameRead, FrameSink, FrameSource, HandDetector, LoopOptions,
    LoopSummary, Tick,
};
pub use questions::RandomQuestions;

pub use bridge::{BridgeDetector, BridgeProcess, FrameHeader};
pub use replay::{ReplayDetector, ReplayFrame, ReplaySource};
