use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── LANDMARK INDICES ─────────────────────────────────────────────────────────
//

/// Number of landmarks reported for a single hand.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Bone connections between landmarks, for drawing a hand skeleton.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC),
    (THUMB_CMC, THUMB_MCP),
    (THUMB_MCP, THUMB_IP),
    (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP),
    (INDEX_MCP, INDEX_PIP),
    (INDEX_PIP, INDEX_DIP),
    (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP),
    (MIDDLE_MCP, MIDDLE_PIP),
    (MIDDLE_PIP, MIDDLE_DIP),
    (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP),
    (RING_MCP, RING_PIP),
    (RING_PIP, RING_DIP),
    (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP),
    (WRIST, PINKY_MCP),
    (PINKY_MCP, PINKY_PIP),
    (PINKY_PIP, PINKY_DIP),
    (PINKY_DIP, PINKY_TIP),
];

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HandError {
    #[error("expected 21 landmarks, got {len}")]
    LandmarkCount { len: usize },

    #[error("unknown handedness label: {0}")]
    UnknownHandedness(String),
}

//
// ─── LANDMARK ─────────────────────────────────────────────────────────────────
//

/// A single hand landmark in normalized frame coordinates.
///
/// `x` and `y` are in `[0, 1]` relative to the frame width and height, with
/// `y` growing downwards. `z` is relative depth and stays `0.0` for 2-D
/// detectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    #[must_use]
    pub const fn planar(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

//
// ─── HANDEDNESS ───────────────────────────────────────────────────────────────
//

/// Which hand the detector believes it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => f.write_str("Left"),
            Handedness::Right => f.write_str("Right"),
        }
    }
}

impl FromStr for Handedness {
    type Err = HandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("left") => Ok(Self::Left),
            s if s.eq_ignore_ascii_case("right") => Ok(Self::Right),
            other => Err(HandError::UnknownHandedness(other.to_string())),
        }
    }
}

//
// ─── HAND ─────────────────────────────────────────────────────────────────────
//

/// One detected hand: 21 landmarks addressed by the index constants above.
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    landmarks: [Landmark; LANDMARK_COUNT],
    handedness: Option<Handedness>,
    score: Option<f32>,
}

impl Hand {
    #[must_use]
    pub fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self {
            landmarks,
            handedness: None,
            score: None,
        }
    }

    /// Build a hand from a detector-provided slice.
    ///
    /// # Errors
    ///
    /// Returns `HandError::LandmarkCount` unless the slice has exactly 21 points.
    pub fn from_slice(points: &[Landmark]) -> Result<Self, HandError> {
        let landmarks: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| HandError::LandmarkCount { len: points.len() })?;
        Ok(Self::new(landmarks))
    }

    #[must_use]
    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = Some(handedness);
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Returns the landmark at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 21`. Use the named index constants.
    #[must_use]
    pub fn landmark(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }

    #[must_use]
    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    #[must_use]
    pub fn handedness(&self) -> Option<Handedness> {
        self.handedness
    }

    #[must_use]
    pub fn score(&self) -> Option<f32> {
        self.score
    }
}

impl Default for Hand {
    fn default() -> Self {
        Self::new([Landmark::default(); LANDMARK_COUNT])
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_requires_exactly_21_points() {
        let points = vec![Landmark::planar(0.5, 0.5); 20];
        let err = Hand::from_slice(&points).unwrap_err();
        assert_eq!(err, HandError::LandmarkCount { len: 20 });

        let points = vec![Landmark::planar(0.5, 0.5); LANDMARK_COUNT];
        let hand = Hand::from_slice(&points).unwrap();
        assert_eq!(hand.landmark(PINKY_TIP), Landmark::planar(0.5, 0.5));
        assert_eq!(hand.handedness(), None);
    }

    #[test]
    fn handedness_parses_detector_labels() {
        assert_eq!("Left".parse::<Handedness>().unwrap(), Handedness::Left);
        assert_eq!(" right ".parse::<Handedness>().unwrap(), Handedness::Right);
        assert!("both".parse::<Handedness>().is_err());
    }

    #[test]
    fn landmark_z_defaults_when_missing() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.25,"y":0.75}"#).unwrap();
        assert_eq!(lm, Landmark::planar(0.25, 0.75));
    }

    #[test]
    fn skeleton_stays_inside_landmark_range() {
        for (a, b) in HAND_CONNECTIONS {
            assert!(a < LANDMARK_COUNT && b < LANDMARK_COUNT);
        }
    }
}
