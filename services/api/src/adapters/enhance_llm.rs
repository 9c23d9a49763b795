//! services/api/src/adapters/enhance_llm.rs
//!
//! Adapter for the enhance-text flow behind the selection menu.

use async_trait::async_trait;
use edusync_core::{
    domain::{EnhanceRequest, EnhanceResult},
    ports::{PortResult, TextEnhancementService},
};

use crate::adapters::llm::{fill_template, PromptRunner};

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert in communication.
You always reply with a single JSON object and nothing else."#;

const USER_INPUT_TEMPLATE: &str = r#"Your task is to enhance and simplify the following text.

Make the text clearer, more concise, and easier to understand. Correct any grammatical errors or awkward phrasing.
Do not change the core meaning of the text.

Original text:
"{text}"

Reply with JSON of exactly this shape:
{"enhancedText": "..."}"#;

#[derive(Clone)]
pub struct OpenAiEnhanceAdapter {
    runner: PromptRunner,
}

impl OpenAiEnhanceAdapter {
    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl TextEnhancementService for OpenAiEnhanceAdapter {
    async fn enhance_text(&self, request: &EnhanceRequest) -> PortResult<EnhanceResult> {
        let prompt = fill_template(USER_INPUT_TEMPLATE, &[("text", request.text.as_str())]);
        self.runner
            .run_json("enhance-text", SYSTEM_INSTRUCTIONS, prompt, &[])
            .await
    }
}
