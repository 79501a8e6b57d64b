use std::ops::RangeInclusive;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::{Question, QuestionSource};

/// Text shown once the answer has been held long enough.
pub const CORRECT_MESSAGE: &str = "Correct!";

//
// ─── CONFIG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizConfigError {
    #[error("{name} must not be negative")]
    NegativeThreshold { name: &'static str },

    #[error("operand range {min}..={max} must be non-empty, start above zero and fit a u32 sum")]
    InvalidOperands { min: u32, max: u32 },
}

/// Timing and question-range settings for a quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    hold_threshold: Duration,
    display_threshold: Duration,
    operands: RangeInclusive<u32>,
}

impl QuizConfig {
    /// # Errors
    ///
    /// Returns `QuizConfigError` if a threshold is negative, or if the operand
    /// range is empty, starts at zero or has sums that overflow a `u32`.
    pub fn new(
        hold_threshold: Duration,
        display_threshold: Duration,
        operands: RangeInclusive<u32>,
    ) -> Result<Self, QuizConfigError> {
        if hold_threshold < Duration::zero() {
            return Err(QuizConfigError::NegativeThreshold {
                name: "hold_threshold",
            });
        }
        if display_threshold < Duration::zero() {
            return Err(QuizConfigError::NegativeThreshold {
                name: "display_threshold",
            });
        }
        if operands.is_empty()
            || *operands.start() == 0
            || operands.end().checked_mul(2).is_none()
        {
            return Err(QuizConfigError::InvalidOperands {
                min: *operands.start(),
                max: *operands.end(),
            });
        }

        Ok(Self {
            hold_threshold,
            display_threshold,
            operands,
        })
    }

    /// How long the correct count must be held before it is confirmed.
    #[must_use]
    pub fn hold_threshold(&self) -> Duration {
        self.hold_threshold
    }

    /// How long "Correct!" stays up before the next question.
    #[must_use]
    pub fn display_threshold(&self) -> Duration {
        self.display_threshold
    }

    #[must_use]
    pub fn operands(&self) -> RangeInclusive<u32> {
        self.operands.clone()
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            hold_threshold: Duration::seconds(3),
            display_threshold: Duration::milliseconds(1500),
            operands: 1..=5,
        }
    }
}

//
// ─── STATE ────────────────────────────────────────────────────────────────────
//

/// Progress towards confirming the current answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizState {
    /// The live count does not match the answer.
    #[default]
    Idle,
    /// The count has matched continuously since `since`.
    Holding { since: DateTime<Utc> },
    /// The hold threshold was met at `since`; "Correct!" is showing.
    Confirmed { since: DateTime<Utc> },
}

impl QuizState {
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, QuizState::Confirmed { .. })
    }
}

//
// ─── OVERLAY ──────────────────────────────────────────────────────────────────
//

/// What to draw over the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub total_fingers: u32,
    pub prompt: String,
    pub show_correct: bool,
    /// The question was replaced after this frame.
    pub advanced: bool,
}

impl Overlay {
    #[must_use]
    pub fn total_label(&self) -> String {
        format!("Total Fingers: {}", self.total_fingers)
    }

    #[must_use]
    pub fn correct_message(&self) -> Option<&'static str> {
        self.show_correct.then_some(CORRECT_MESSAGE)
    }
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// A running quiz: the current question plus the hold/confirm timers.
#[derive(Debug)]
pub struct QuizSession<Q> {
    config: QuizConfig,
    questions: Q,
    question: Question,
    state: QuizState,
    solved: u32,
}

impl<Q: QuestionSource> QuizSession<Q> {
    /// Starts a session with the first question drawn from `questions`.
    pub fn new(config: QuizConfig, mut questions: Q) -> Self {
        let question = questions.next_question();
        Self {
            config,
            questions,
            question,
            state: QuizState::Idle,
            solved: 0,
        }
    }

    /// Feeds one frame's finger total observed at `now`.
    ///
    /// The returned overlay always carries the prompt that was on screen when
    /// the frame was judged. When `advanced` is set, the next call already
    /// uses the new question.
    pub fn update(&mut self, total_fingers: u32, now: DateTime<Utc>) -> Overlay {
        let prompt = self.question.prompt().to_string();

        if total_fingers != self.question.answer() {
            self.state = QuizState::Idle;
            return Overlay {
                total_fingers,
                prompt,
                show_correct: false,
                advanced: false,
            };
        }

        if self.state == QuizState::Idle {
            self.state = QuizState::Holding { since: now };
        }

        if let QuizState::Holding { since } = self.state {
            if now - since >= self.config.hold_threshold {
                self.state = QuizState::Confirmed { since: now };
            }
        }

        let QuizState::Confirmed { since } = self.state else {
            return Overlay {
                total_fingers,
                prompt,
                show_correct: false,
                advanced: false,
            };
        };

        let advanced = now - since >= self.config.display_threshold;
        if advanced {
            self.question = self.questions.next_question();
            self.state = QuizState::Idle;
            self.solved = self.solved.saturating_add(1);
        }

        Overlay {
            total_fingers,
            prompt,
            show_correct: true,
            advanced,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        self.state
    }

    /// Number of questions answered and advanced past.
    #[must_use]
    pub fn solved(&self) -> u32 {
        self.solved
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScriptedQuestions;
    use crate::time::fixed_now;

    fn session() -> QuizSession<ScriptedQuestions> {
        let script =
            ScriptedQuestions::new(vec![Question::addition(2, 3), Question::addition(1, 1)])
                .unwrap();
        QuizSession::new(QuizConfig::default(), script)
    }

    fn ms(millis: i64) -> Duration {
        Duration::milliseconds(millis)
    }

    #[test]
    fn mismatch_stays_idle() {
        let mut quiz = session();
        let overlay = quiz.update(4, fixed_now());
        assert_eq!(quiz.state(), QuizState::Idle);
        assert_eq!(overlay.prompt, "2 + 3 = ?");
        assert_eq!(overlay.correct_message(), None);
        assert_eq!(overlay.total_label(), "Total Fingers: 4");
    }

    #[test]
    fn drop_before_hold_threshold_resets_without_credit() {
        let start = fixed_now();
        let mut quiz = session();

        for step in 0..=29 {
            let overlay = quiz.update(5, start + ms(step * 100));
            assert!(!overlay.show_correct);
        }
        assert_eq!(quiz.state(), QuizState::Holding { since: start });

        let overlay = quiz.update(3, start + ms(3000));
        assert_eq!(quiz.state(), QuizState::Idle);
        assert!(!overlay.show_correct);
        assert_eq!(quiz.question().answer(), 5);
        assert_eq!(quiz.solved(), 0);
    }

    #[test]
    fn held_answer_confirms_then_advances() {
        let start = fixed_now();
        let mut quiz = session();

        quiz.update(5, start);
        let overlay = quiz.update(5, start + ms(3000));
        assert_eq!(overlay.correct_message(), Some(CORRECT_MESSAGE));
        assert_eq!(quiz.state(), QuizState::Confirmed {
            since: start + ms(3000)
        });

        let overlay = quiz.update(5, start + ms(4400));
        assert!(overlay.show_correct);
        assert!(!overlay.advanced);

        let overlay = quiz.update(5, start + ms(4500));
        assert!(overlay.show_correct);
        assert!(overlay.advanced);
        assert_eq!(overlay.prompt, "2 + 3 = ?");
        assert_eq!(quiz.state(), QuizState::Idle);
        assert_eq!(quiz.question().prompt(), "1 + 1 = ?");
        assert_eq!(quiz.solved(), 1);

        // Still showing five fingers, but the new answer is two.
        let overlay = quiz.update(5, start + ms(4600));
        assert!(!overlay.show_correct);
        assert_eq!(quiz.state(), QuizState::Idle);
    }

    #[test]
    fn one_frame_drop_restarts_the_hold() {
        let start = fixed_now();
        let mut quiz = session();

        quiz.update(5, start);
        quiz.update(5, start + ms(2999));
        quiz.update(0, start + ms(3000));
        assert_eq!(quiz.state(), QuizState::Idle);

        let resumed = start + ms(3033);
        quiz.update(5, resumed);
        let overlay = quiz.update(5, resumed + ms(2999));
        assert!(!overlay.show_correct);

        let overlay = quiz.update(5, resumed + ms(3000));
        assert!(overlay.show_correct);
        assert_eq!(quiz.state(), QuizState::Confirmed {
            since: resumed + ms(3000)
        });
    }

    #[test]
    fn drop_while_confirmed_loses_progress() {
        let start = fixed_now();
        let mut quiz = session();

        quiz.update(5, start);
        quiz.update(5, start + ms(3000));
        assert!(quiz.state().is_confirmed());

        let overlay = quiz.update(6, start + ms(3500));
        assert!(!overlay.show_correct);
        assert_eq!(quiz.state(), QuizState::Idle);
        assert_eq!(quiz.question().answer(), 5);
    }

    #[test]
    fn repeated_update_at_same_instant_is_stable() {
        let now = fixed_now();
        let mut quiz = session();

        let first = quiz.update(5, now);
        let state = quiz.state();
        for _ in 0..5 {
            assert_eq!(quiz.update(5, now), first);
            assert_eq!(quiz.state(), state);
        }
    }

    #[test]
    fn zero_thresholds_cascade_in_one_update() {
        let config = QuizConfig::new(Duration::zero(), Duration::zero(), 1..=5).unwrap();
        let script = ScriptedQuestions::new(vec![Question::addition(1, 2)]).unwrap();
        let mut quiz = QuizSession::new(config, script);

        let overlay = quiz.update(3, fixed_now());
        assert!(overlay.show_correct);
        assert!(overlay.advanced);
        assert_eq!(quiz.solved(), 1);
    }

    #[test]
    fn config_rejects_bad_values() {
        assert_eq!(
            QuizConfig::new(ms(-1), ms(0), 1..=5).unwrap_err(),
            QuizConfigError::NegativeThreshold {
                name: "hold_threshold"
            }
        );
        assert_eq!(
            QuizConfig::new(ms(0), ms(-1), 1..=5).unwrap_err(),
            QuizConfigError::NegativeThreshold {
                name: "display_threshold"
            }
        );
        assert!(matches!(
            QuizConfig::new(ms(0), ms(0), 0..=5),
            Err(QuizConfigError::InvalidOperands { min: 0, max: 5 })
        ));
        #[allow(clippy::reversed_empty_ranges)]
        let empty = 5..=1;
        assert!(QuizConfig::new(ms(0), ms(0), empty).is_err());

        assert!(matches!(
            QuizConfig::new(ms(0), ms(0), 1..=u32::MAX),
            Err(QuizConfigError::InvalidOperands { .. })
        ));
        let widest = u32::MAX / 2;
        let config = QuizConfig::new(ms(0), ms(0), widest..=widest).unwrap();
        assert_eq!(config.operands(), widest..=widest);
    }

    #[test]
    fn default_config_matches_game_timing() {
        let config = QuizConfig::default();
        assert_eq!(config.hold_threshold(), Duration::seconds(3));
        assert_eq!(config.display_threshold(), ms(1500));
        assert_eq!(config.operands(), 1..=5);
    }
}
