use opencv::core::Mat;
use opencv::prelude::*;
use services::{BridgeProcess, DetectorError, FrameHeader, HandDetector};

use finger_core::model::Hand;

/// Feeds OpenCV frames to the detector process.
pub struct BridgeOnMat {
    bridge: BridgeProcess,
}

impl BridgeOnMat {
    pub fn new(bridge: BridgeProcess) -> Self {
        Self { bridge }
    }
}

impl HandDetector for BridgeOnMat {
    type Frame = Mat;

    fn detect(&mut self, frame: &Mat) -> Result<Vec<Hand>, DetectorError> {
        let header = FrameHeader {
            width: u32::try_from(frame.cols()).unwrap_or(0),
            height: u32::try_from(frame.rows()).unwrap_or(0),
            channels: u32::try_from(frame.channels()).unwrap_or(0),
        };

        // `data_bytes` needs a continuous buffer; flipped frames usually are.
        let continuous;
        let frame = if frame.is_continuous() {
            frame
        } else {
            continuous = frame.try_clone().map_err(|err| {
                DetectorError::Io(std::io::Error::other(err.to_string()))
            })?;
            &continuous
        };

        let data = frame
            .data_bytes()
            .map_err(|err| DetectorError::Io(std::io::Error::other(err.to_string())))?;
        self.bridge.detect_raw(header, data)
    }
}
