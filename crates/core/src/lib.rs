#![forbid(unsafe_code)]

pub mod counter;
pub mod model;
pub mod quiz;
pub mod time;

pub use counter::{
    ThumbRule, count_fingers, count_fingers_with, extended_fingers, total_fingers,
    total_fingers_with,
};
pub use model::{Finger, Hand, Handedness, Landmark, Question, QuestionSource};
pub use quiz::{CORRECT_MESSAGE, Overlay, QuizConfig, QuizConfigError, QuizSession, QuizState};
pub use time::Clock;
