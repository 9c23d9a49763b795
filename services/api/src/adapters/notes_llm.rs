//! services/api/src/adapters/notes_llm.rs
//!
//! This module contains the adapter for the notes-generator flow.
//! It implements the `NotesGenerationService` port from the `core` crate.

use async_trait::async_trait;
use edusync_core::{
    domain::{NotesRequest, NotesResult, SourceMaterial},
    ports::{NotesGenerationService, PortResult},
};

use crate::adapters::llm::{fill_template, PromptRunner};

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert educator specializing in creating concise study materials for the South African school curriculum.
You always reply with a single JSON object and nothing else."#;

const USER_INPUT_TEMPLATE: &str = r#"Your task is to generate "flip notes" or flashcard-style notes for the given subject and topic.

Generate exactly {count} notes.

Subject: {subject}
Topic: {topic}

{source}

Generate a list of {count} key terms, concepts, or questions and their corresponding definitions or explanations.
The "term" should be what's on the front of the flashcard, and the "definition" should be on the back.
Keep the definitions clear, concise, and easy to understand for a student.
Focus on the most important information.

Reply with JSON of exactly this shape:
{"notes": [{"term": "...", "definition": "..."}]}"#;

/// Fills in the notes template. Source text beats images, images beat general knowledge.
pub fn render_prompt(request: &NotesRequest) -> String {
    let source = match request.source() {
        SourceMaterial::Text(text) => format!(
            "Use the following text as the exclusive source material for the notes. The topic and subject provide context.\n---\n{}\n---",
            text
        ),
        SourceMaterial::Images(images) => format!(
            "Use the information from the {} attached image(s) as the primary source material. The topic provides context.",
            images.len()
        ),
        SourceMaterial::GeneralKnowledge => {
            "Use your general knowledge for the given subject and topic.".to_string()
        }
    };
    let count = request.notes_count.to_string();
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

/// An adapter that implements `NotesGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiNotesAdapter {
    runner: PromptRunner,
}

impl OpenAiNotesAdapter {
    /// Creates a new `OpenAiNotesAdapter`.
    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }
}

//=========================================================================================
// `NotesGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl NotesGenerationService for OpenAiNotesAdapter {
    async fn generate_notes(&self, request: &NotesRequest) -> PortResult<NotesResult> {
        let images: &[String] = match request.source() {
            SourceMaterial::Images(images) => images,
            _ => &[],
        };
        self.runner
            .run_json("notes-generator", SYSTEM_INSTRUCTIONS, render_prompt(request), images)
            .await
    }
}
