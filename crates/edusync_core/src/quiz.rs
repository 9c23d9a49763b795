//! crates/edusync_core/src/quiz.rs
//!
//! Quiz attempt state: the answer map, scoring, score tiers and the countdown
//! duration. The attempt can be submitted exactly once, whether by the learner
//! or by the countdown running out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::domain::{FeedbackRequest, IncorrectAnswer, QuizResult};
use crate::ports::{PortError, PortResult};

/// Question index to the option the learner picked.
pub type UserAnswers = BTreeMap<usize, String>;

pub const QUIZ_DURATION_RANGE: RangeInclusive<u32> = 10..=120;
pub const DEFAULT_QUIZ_DURATION_SECS: u32 = 60;

//=========================================================================================
// Countdown Duration
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizDuration(u32);

impl QuizDuration {
    pub fn from_secs(secs: u32) -> PortResult<Self> {
        if !QUIZ_DURATION_RANGE.contains(&secs) {
            return Err(PortError::Validation(format!(
                "Quiz duration must be between {} and {} seconds.",
                QUIZ_DURATION_RANGE.start(),
                QUIZ_DURATION_RANGE.end()
            )));
        }
        Ok(Self(secs))
    }

    pub fn secs(self) -> u32 {
        self.0
    }
}

impl Default for QuizDuration {
    fn default() -> Self {
        Self(DEFAULT_QUIZ_DURATION_SECS)
    }
}

//=========================================================================================
// Scoring
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Good,
    Middling,
    Poor,
}

impl ScoreTier {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            75.. => ScoreTier::Good,
            50..=74 => ScoreTier::Middling,
            _ => ScoreTier::Poor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
}

impl Score {
    pub fn calculate(quiz: &QuizResult, answers: &UserAnswers) -> Self {
        let correct = quiz
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| answers.get(i) == Some(&q.correct_answer))
            .count();
        let total = quiz.questions.len();
        let percentage = if total == 0 {
            0
        } else {
            // Integer form of round-half-up on correct / total * 100.
            ((200 * correct + total) / (2 * total)) as u32
        };
        Self {
            correct,
            total,
            percentage,
        }
    }

    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_percentage(self.percentage)
    }
}

/// Every question whose answer is missing or wrong, in quiz order.
/// Missing answers appear with an empty `user_answer`.
pub fn incorrect_answers(quiz: &QuizResult, answers: &UserAnswers) -> Vec<IncorrectAnswer> {
    quiz.questions
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(i) != Some(&q.correct_answer))
        .map(|(i, q)| IncorrectAnswer {
            question_text: q.question_text.clone(),
            user_answer: answers.get(&i).cloned().unwrap_or_default(),
            correct_answer: q.correct_answer.clone(),
            explanation: q.explanation.clone(),
        })
        .collect()
}

//=========================================================================================
// Attempt
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitKind {
    Manual,
    Timer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizOutcome {
    pub score: Score,
    pub tier: ScoreTier,
    pub auto_submitted: bool,
    pub incorrect: Vec<IncorrectAnswer>,
}

/// One learner's pass through a generated quiz.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    pub subject: String,
    pub topic: String,
    pub quiz: QuizResult,
    answers: UserAnswers,
    submitted: Option<SubmitKind>,
}

impl QuizAttempt {
    pub fn new(subject: String, topic: String, quiz: QuizResult) -> Self {
        Self {
            subject,
            topic,
            quiz,
            answers: UserAnswers::new(),
            submitted: None,
        }
    }

    pub fn answers(&self) -> &UserAnswers {
        &self.answers
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn is_complete(&self) -> bool {
        (0..self.quiz.questions.len()).all(|i| self.answers.contains_key(&i))
    }

    pub fn select_answer(&mut self, index: usize, option: &str) -> PortResult<()> {
        if self.submitted.is_some() {
            return Err(PortError::Validation(
                "This quiz has already been submitted.".to_string(),
            ));
        }
        let question = self.quiz.questions.get(index).ok_or_else(|| {
            PortError::Validation(format!("There is no question {}.", index + 1))
        })?;
        if !question.options.iter().any(|o| o == option) {
            return Err(PortError::Validation(format!(
                "'{}' is not an option for question {}.",
                option,
                index + 1
            )));
        }
        self.answers.insert(index, option.to_string());
        Ok(())
    }

    /// Locks the attempt and scores it. A manual submit needs every question
    /// answered; a timer submit takes whatever has been answered so far.
    pub fn submit(&mut self, kind: SubmitKind) -> PortResult<QuizOutcome> {
        if self.submitted.is_some() {
            return Err(PortError::Validation(
                "This quiz has already been submitted.".to_string(),
            ));
        }
        if kind == SubmitKind::Manual && !self.is_complete() {
            return Err(PortError::Validation(
                "Answer every question before submitting.".to_string(),
            ));
        }
        self.submitted = Some(kind);
        let score = Score::calculate(&self.quiz, &self.answers);
        Ok(QuizOutcome {
            score,
            tier: score.tier(),
            auto_submitted: kind == SubmitKind::Timer,
            incorrect: incorrect_answers(&self.quiz, &self.answers),
        })
    }

    pub fn feedback_request(&self, outcome: &QuizOutcome) -> FeedbackRequest {
        FeedbackRequest {
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            incorrect_answers: outcome.incorrect.clone(),
        }
    }
}
