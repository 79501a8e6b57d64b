use opencv::core::{self, Mat};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use services::{CaptureError, Captured, Clock, FrameRead, FrameSource};
use tracing::{debug, info};

use super::backend;

/// A webcam producing mirrored (selfie-view) frames.
pub struct Camera {
    capture: VideoCapture,
    clock: Clock,
}

impl Camera {
    /// # Errors
    ///
    /// Returns `CaptureError::Unavailable` if the device cannot be opened.
    pub fn open(index: i32) -> Result<Self, CaptureError> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|err| CaptureError::Backend(backend(err)))?;
        let opened = capture
            .is_opened()
            .map_err(|err| CaptureError::Backend(backend(err)))?;
        if !opened {
            return Err(CaptureError::Unavailable { index });
        }

        info!(index, "camera opened");
        Ok(Self {
            capture,
            clock: Clock::default_clock(),
        })
    }
}

impl FrameSource for Camera {
    type Frame = Mat;

    fn next_frame(&mut self) -> Result<FrameRead<Mat>, CaptureError> {
        let opened = self
            .capture
            .is_opened()
            .map_err(|err| CaptureError::Backend(backend(err)))?;
        if !opened {
            return Ok(FrameRead::Closed);
        }

        let mut raw = Mat::default();
        let grabbed = self
            .capture
            .read(&mut raw)
            .map_err(|err| CaptureError::Backend(backend(err)))?;
        if !grabbed || raw.empty() {
            return Ok(FrameRead::Empty);
        }
        let at = self.clock.now();

        let mut mirrored = Mat::default();
        core::flip(&raw, &mut mirrored, 1).map_err(|err| CaptureError::Backend(backend(err)))?;

        Ok(FrameRead::Frame(Captured {
            frame: mirrored,
            at,
        }))
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Err(err) = self.capture.release() {
            debug!(error = %err, "camera release failed");
        }
    }
}
