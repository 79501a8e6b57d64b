use std::ops::RangeInclusive;

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

use finger_core::model::{Question, QuestionSource};
use finger_core::quiz::QuizConfig;

/// Draws addition questions with both operands uniform over the configured
/// range (`1..=5` by default, so answers fall in `2..=10`).
#[derive(Debug, Clone)]
pub struct RandomQuestions<R = ThreadRng> {
    rng: R,
    operands: RangeInclusive<u32>,
}

impl RandomQuestions<ThreadRng> {
    #[must_use]
    pub fn new(config: &QuizConfig) -> Self {
        Self {
            rng: rand::rng(),
            operands: config.operands(),
        }
    }
}

impl RandomQuestions<StdRng> {
    /// Reproducible questions for tests and replays.
    #[must_use]
    pub fn seeded(config: &QuizConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            operands: config.operands(),
        }
    }
}

impl<R: Rng> QuestionSource for RandomQuestions<R> {
    fn next_question(&mut self) -> Question {
        let a = self.rng.random_range(self.operands.clone());
        let b = self.rng.random_range(self.operands.clone());
        Question::addition(a, b)
    }
}
