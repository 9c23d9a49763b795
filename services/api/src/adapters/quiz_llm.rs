//! services/api/src/adapters/quiz_llm.rs
//!
//! This module contains the adapter for the quiz-generator flow.
//! It implements the `QuizGenerationService` port from the `core` crate.

use async_trait::async_trait;
use edusync_core::{
    domain::{QuizRequest, QuizResult, SourceMaterial},
    ports::{PortResult, QuizGenerationService},
};

use crate::adapters::llm::{fill_template, PromptRunner};

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert educator and quiz creator specializing in the South African school curriculum.
You always reply with a single JSON object and nothing else."#;

const USER_INPUT_TEMPLATE: &str = r#"Your task is to create a multiple-choice quiz based on the provided subject and topic.

Subject: {subject}
Topic: {topic}
Number of Questions: {count}

{source}

Generate exactly {count} high-quality multiple-choice questions.
Each question must have:
1. A clear and concise question text.
2. Four distinct options.
3. A single correct answer, which must be one of the four options, copied exactly.
4. A brief, clear explanation for the correct answer.

Ensure the questions are relevant and appropriate for a student studying the South African curriculum.

Reply with JSON of exactly this shape:
{"questions": [{"questionText": "...", "options": ["...", "...", "...", "..."], "correctAnswer": "...", "explanation": "..."}]}"#;

/// Fills in the quiz template. Source text beats images, images beat general knowledge.
pub fn render_prompt(request: &QuizRequest) -> String {
    let source = match request.source() {
        SourceMaterial::Text(text) => format!(
            "Use the following text as the exclusive source material for the questions. The topic and subject provide context.\n---\n{}\n---",
            text
        ),
        SourceMaterial::Images(images) => format!(
            "Use the information from the {} attached image(s) as the primary source material for the questions. The topic provides context.",
            images.len()
        ),
        SourceMaterial::GeneralKnowledge => {
            "Use your general knowledge for the given subject and topic.".to_string()
        }
    };
    let count = request.question_count.to_string();
    fill_template(
        USER_INPUT_TEMPLATE,
        &[
            ("count", count.as_str()),
            ("subject", request.subject.as_str()),
            ("topic", request.topic.as_str()),
            ("source", source.as_str()),
        ],
    )
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QuizGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiQuizAdapter {
    runner: PromptRunner,
}

impl OpenAiQuizAdapter {
    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl QuizGenerationService for OpenAiQuizAdapter {
    async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<QuizResult> {
        let images: &[String] = match request.source() {
            SourceMaterial::Images(images) => images,
            _ => &[],
        };
        self.runner
            .run_json("quiz-generator", SYSTEM_INSTRUCTIONS, render_prompt(request), images)
            .await
    }
}
