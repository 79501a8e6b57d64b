//! Out-of-process hand detector.
//!
//! The detector runs as a child process speaking a small line protocol:
//!
//! - On start it prints `READY` on its own line.
//! - For each frame it reads a 12-byte header (`width`, `height`, `channels`
//!   as little-endian `u32`) followed by `width * height * channels` raw BGR
//!   bytes.
//! - It answers with one JSON line:
//!   `{"hands":[{"handedness":"Left","score":0.93,"landmarks":[{"x":0.1,"y":0.2,"z":0.0}, ...]}],"error":null}`
//!
//! The child's stdout is drained on a reader thread so a detector that stops
//! answering surfaces as [`DetectorError::Stalled`] instead of blocking the
//! frame loop forever.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use finger_core::model::{Hand, Handedness, Landmark};

use crate::error::DetectorError;

pub const READY_LINE: &str = "READY";

/// Hands scored below this are ignored.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;

/// Model loading can take a while on first start.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

//
// ─── FRAMES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl FrameHeader {
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }

    fn to_bytes(self) -> [u8; 12] {
        let mut out = [0_u8; 12];
        out[0..4].copy_from_slice(&self.width.to_le_bytes());
        out[4..8].copy_from_slice(&self.height.to_le_bytes());
        out[8..12].copy_from_slice(&self.channels.to_le_bytes());
        out
    }
}

//
// ─── WIRE FORMAT ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct WireHand {
    #[serde(default)]
    handedness: Option<String>,
    #[serde(default)]
    score: Option<f32>,
    landmarks: Vec<Landmark>,
}

#[derive(Debug, Deserialize)]
struct WireDetection {
    #[serde(default)]
    hands: Vec<WireHand>,
    #[serde(default)]
    error: Option<String>,
}

/// Converts wire hands, dropping low-confidence and malformed entries.
pub(crate) fn hands_from_wire(hands: Vec<WireHand>, min_confidence: f32) -> Vec<Hand> {
    hands
        .into_iter()
        .filter_map(|wire| {
            if wire.score.is_some_and(|score| score < min_confidence) {
                debug!(score = ?wire.score, "dropping low-confidence hand");
                return None;
            }

            let mut hand = match Hand::from_slice(&wire.landmarks) {
                Ok(hand) => hand,
                Err(err) => {
                    warn!(error = %err, "skipping malformed hand");
                    return None;
                }
            };

            if let Some(label) = wire.handedness.as_deref() {
                match label.parse::<Handedness>() {
                    Ok(handedness) => hand = hand.with_handedness(handedness),
                    Err(err) => warn!(error = %err, "ignoring handedness"),
                }
            }
            if let Some(score) = wire.score {
                hand = hand.with_score(score);
            }
            Some(hand)
        })
        .collect()
}

/// Parses one detector response line.
///
/// # Errors
///
/// Returns `DetectorError::Payload` for invalid JSON and
/// `DetectorError::Reported` when the detector sent an error message.
pub fn parse_response(line: &str, min_confidence: f32) -> Result<Vec<Hand>, DetectorError> {
    let detection: WireDetection = serde_json::from_str(line.trim())?;
    if let Some(message) = detection.error {
        return Err(DetectorError::Reported(message));
    }
    Ok(hands_from_wire(detection.hands, min_confidence))
}

//
// ─── DETECTOR ─────────────────────────────────────────────────────────────────
//

/// Speaks the bridge protocol over any writer/reader pair.
pub struct BridgeDetector<W, R> {
    writer: W,
    reader: R,
    min_confidence: f32,
    line: String,
}

impl<W: Write, R: BufRead> BridgeDetector<W, R> {
    /// Waits for the `READY` handshake.
    ///
    /// # Errors
    ///
    /// Returns `DetectorError::NotReady` if the first line is anything else,
    /// `DetectorError::Closed` if the stream ends first.
    pub fn connect(writer: W, mut reader: R) -> Result<Self, DetectorError> {
        let mut line = String::new();
        if read_reply(&mut reader, &mut line)? == 0 {
            return Err(DetectorError::Closed);
        }
        if line.trim() != READY_LINE {
            return Err(DetectorError::NotReady(line.trim().to_string()));
        }

        Ok(Self {
            writer,
            reader,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            line,
        })
    }

    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    /// Sends one frame and reads back the detected hands.
    ///
    /// # Errors
    ///
    /// Returns `DetectorError::FrameSize` if `data` does not match `header`,
    /// `DetectorError::Closed` if the detector hung up, `DetectorError::Stalled`
    /// if it stopped answering, or any I/O or payload error.
    pub fn detect_raw(
        &mut self,
        header: FrameHeader,
        data: &[u8],
    ) -> Result<Vec<Hand>, DetectorError> {
        let expected = header.byte_len();
        if data.len() != expected {
            return Err(DetectorError::FrameSize {
                len: data.len(),
                expected,
            });
        }

        self.writer.write_all(&header.to_bytes())?;
        self.writer.write_all(data)?;
        self.writer.flush()?;

        self.line.clear();
        if read_reply(&mut self.reader, &mut self.line)? == 0 {
            return Err(DetectorError::Closed);
        }
        parse_response(&self.line, self.min_confidence)
    }
}

fn read_reply(reader: &mut impl BufRead, line: &mut String) -> Result<usize, DetectorError> {
    reader.read_line(line).map_err(|err| match err.kind() {
        io::ErrorKind::TimedOut => DetectorError::Stalled,
        _ => DetectorError::Io(err),
    })
}

//
// ─── READER THREAD ────────────────────────────────────────────────────────────
//

/// Bytes forwarded from a reader thread, with a deadline on every read.
///
/// A read that waits longer than `timeout` fails with `ErrorKind::TimedOut`.
/// When the sending side is gone the reader reports end of stream.
pub struct ChannelReader {
    chunks: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
    timeout: Duration,
}

impl ChannelReader {
    #[must_use]
    pub fn new(chunks: Receiver<Vec<u8>>, timeout: Duration) -> Self {
        Self {
            chunks,
            pending: Vec::new(),
            pos: 0,
            timeout,
        }
    }

    /// Drains `source` on a background thread until it closes.
    pub fn spawn(mut source: impl Read + Send + 'static, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0_u8; 8192];
            loop {
                match source.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                    Err(err) => {
                        debug!(error = %err, "detector output closed");
                        break;
                    }
                }
            }
        });
        Self::new(rx, timeout)
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos == self.pending.len() {
            match self.chunks.recv_timeout(self.timeout) {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "detector did not answer in time",
                    ));
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }

        let n = (self.pending.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

//
// ─── CHILD PROCESS ────────────────────────────────────────────────────────────
//

/// A detector child process. Dropping it kills and reaps the process.
///
/// Each reply must arrive within [`DEFAULT_REPLY_TIMEOUT`]; a detector that
/// misses it is treated as dead and stops the loop.
pub struct BridgeProcess {
    child: Child,
    detector: BridgeDetector<ChildStdin, BufReader<ChannelReader>>,
}

impl BridgeProcess {
    /// Starts `command` (program followed by whitespace-separated arguments).
    ///
    /// # Errors
    ///
    /// Returns `DetectorError::EmptyCommand`, a spawn I/O error, or a
    /// handshake failure (including no `READY` within [`DEFAULT_READY_TIMEOUT`]).
    pub fn spawn(command: &str) -> Result<Self, DetectorError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(DetectorError::EmptyCommand)?;

        info!(command, "starting hand detector");
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let pipes = child.stdin.take().zip(child.stdout.take());
        let connected = match pipes {
            Some((stdin, stdout)) => {
                let reader = ChannelReader::spawn(stdout, DEFAULT_READY_TIMEOUT);
                BridgeDetector::connect(stdin, BufReader::new(reader))
            }
            None => Err(DetectorError::Closed),
        };

        match connected {
            Ok(mut detector) => {
                info!("hand detector ready");
                detector.reader.get_mut().set_timeout(DEFAULT_REPLY_TIMEOUT);
                Ok(Self { child, detector })
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.detector.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    /// # Errors
    ///
    /// See [`BridgeDetector::detect_raw`].
    pub fn detect_raw(
        &mut self,
        header: FrameHeader,
        data: &[u8],
    ) -> Result<Vec<Hand>, DetectorError> {
        self.detector.detect_raw(header, data)
    }
}

impl Drop for BridgeProcess {
    fn drop(&mut self) {
        if let Err(err) = self.child.kill() {
            debug!(error = %err, "detector already exited");
        }
        let _ = self.child.wait();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
