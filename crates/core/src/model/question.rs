use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("a scripted question list needs at least one question")]
    EmptyScript,
}

/// An addition question shown on screen, answered by raising fingers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    prompt: String,
    answer: u32,
}

impl Question {
    /// Builds `"<a> + <b> = ?"` with answer `a + b`.
    #[must_use]
    pub fn addition(a: u32, b: u32) -> Self {
        Self {
            prompt: format!("{a} + {b} = ?"),
            answer: a + b,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn answer(&self) -> u32 {
        self.answer
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prompt)
    }
}

/// Supplies a fresh question whenever the quiz advances.
pub trait QuestionSource {
    fn next_question(&mut self) -> Question;
}

/// Cycles through a fixed list of questions.
#[derive(Debug, Clone)]
pub struct ScriptedQuestions {
    questions: Vec<Question>,
    next: usize,
}

impl ScriptedQuestions {
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyScript` if `questions` is empty.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::EmptyScript);
        }
        Ok(Self { questions, next: 0 })
    }
}

impl QuestionSource for ScriptedQuestions {
    fn next_question(&mut self) -> Question {
        let question = self.questions[self.next].clone();
        self.next = (self.next + 1) % self.questions.len();
        question
    }
}
