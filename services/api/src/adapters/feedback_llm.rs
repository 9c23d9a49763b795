//! services/api/src/adapters/feedback_llm.rs
//!
//! This module contains the adapter for the quiz-feedback flow.
//! It implements the `QuizFeedbackService` port from the `core` crate.
//! The empty-list shortcut lives in `edusync_core::flows`, so this adapter is
//! only called when there is something to say.

use async_trait::async_trait;
use edusync_core::{
    domain::{FeedbackRequest, FeedbackResult},
    ports::{PortResult, QuizFeedbackService},
};

use crate::adapters::llm::{fill_template, PromptRunner};

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert tutor for the South African school curriculum.
You always reply with a single JSON object and nothing else."#;

const USER_INPUT_TEMPLATE: &str = r#"Your task is to provide constructive, encouraging, and actionable feedback to a learner based on their incorrect answers in a quiz.

Subject: {subject}
Topic: {topic}

The learner made the following mistakes:
{mistakes}

Analyze the pattern of errors. Identify the core concepts the learner seems to be struggling with.

Provide a summary of where they went wrong and what they should focus on to improve.
Keep the tone positive and encouraging. Frame the feedback as a guide to success, not a criticism of failure.
Address the learner directly (e.g., "It looks like you're on the right track, but...").
The feedback should be a single block of text.

Reply with JSON of exactly this shape:
{"feedback": "..."}"#;

pub fn render_prompt(request: &FeedbackRequest) -> String {
    let mistakes = request
        .incorrect_answers
        .iter()
        .map(|a| {
            let their_answer = if a.user_answer.is_empty() {
                "(no answer)"
            } else {
                a.user_answer.as_str()
            };
            format!(
                "- Question: \"{}\"\n  - Their Answer: \"{}\"\n  - Correct Answer: \"{}\"\n  - Explanation: \"{}\"",
                a.question_text, their_answer, a.correct_answer, a.explanation
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    fill_template(
        USER_INPUT_TEMPLATE,
        &[
            ("subject", request.subject.as_str()),
            ("topic", request.topic.as_str()),
            ("mistakes", mistakes.as_str()),
        ],
    )
}

/// An adapter that implements `QuizFeedbackService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiFeedbackAdapter {
    runner: PromptRunner,
}

impl OpenAiFeedbackAdapter {
    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl QuizFeedbackService for OpenAiFeedbackAdapter {
    async fn generate_feedback(&self, request: &FeedbackRequest) -> PortResult<FeedbackResult> {
        self.runner
            .run_json("quiz-feedback", SYSTEM_INSTRUCTIONS, render_prompt(request), &[])
            .await
    }
}
