//! Finger counting over the 21-point hand model.
//!
//! A finger counts as raised when its tip is past the joint two landmarks
//! below it. The four long fingers compare `y` (smaller is higher on screen).
//! The thumb compares `x`, which only works for a mirrored selfie view of a
//! right hand unless [`ThumbRule::Handedness`] is selected.

use serde::{Deserialize, Serialize};

use crate::model::{Finger, Hand, Handedness};

/// How the thumb's sideways extension is judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbRule {
    /// Tip left of the MCP joint, whatever hand it is.
    #[default]
    Mirrored,
    /// Like `Mirrored`, but flipped for hands the detector labels `Left`.
    Handedness,
}

impl ThumbRule {
    /// Parses `mirrored` or `handedness`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mirrored" => Some(Self::Mirrored),
            "handedness" => Some(Self::Handedness),
            _ => None,
        }
    }
}

/// Returns whether each finger is extended, in `Finger::ALL` order.
#[must_use]
pub fn extended_fingers(hand: &Hand, rule: ThumbRule) -> [bool; 5] {
    Finger::ALL.map(|finger| is_extended(hand, finger, rule))
}

/// Whether a single finger is extended.
#[must_use]
pub fn is_extended(hand: &Hand, finger: Finger, rule: ThumbRule) -> bool {
    let tip = hand.landmark(finger.tip());
    let joint = hand.landmark(finger.reference_joint());

    match finger {
        Finger::Thumb => {
            let flipped =
                rule == ThumbRule::Handedness && hand.handedness() == Some(Handedness::Left);
            if flipped {
                tip.x > joint.x
            } else {
                tip.x < joint.x
            }
        }
        _ => tip.y < joint.y,
    }
}

/// Number of raised fingers on one hand, `0..=5`, using the mirrored thumb rule.
#[must_use]
pub fn count_fingers(hand: &Hand) -> u32 {
    count_fingers_with(hand, ThumbRule::Mirrored)
}

#[must_use]
pub fn count_fingers_with(hand: &Hand, rule: ThumbRule) -> u32 {
    extended_fingers(hand, rule)
        .into_iter()
        .map(u32::from)
        .sum()
}

/// Sum of raised fingers over every detected hand.
#[must_use]
pub fn total_fingers(hands: &[Hand]) -> u32 {
    total_fingers_with(hands, ThumbRule::Mirrored)
}

#[must_use]
pub fn total_fingers_with(hands: &[Hand], rule: ThumbRule) -> u32 {
    hands.iter().map(|hand| count_fingers_with(hand, rule)).sum()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
