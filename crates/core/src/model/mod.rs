mod finger;
pub mod hand;
mod question;

pub use finger::Finger;
pub use hand::{HAND_CONNECTIONS, Hand, HandError, Handedness, LANDMARK_COUNT, Landmark};
pub use question::{Question, QuestionError, QuestionSource, ScriptedQuestions};
