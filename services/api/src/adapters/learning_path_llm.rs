//! services/api/src/adapters/learning_path_llm.rs
//!
//! Adapter for the learning-path suggestions flow shown on the dashboard.

use async_trait::async_trait;
use edusync_core::{
    domain::{LearningPathRequest, LearningPathResult},
    ports::{LearningPathService, PortResult},
};

use crate::adapters::llm::{fill_template, PromptRunner};

const SYSTEM_INSTRUCTIONS: &str = r#"You are a learning path suggestion expert. You will suggest learning materials to the user based on their learning goals and activity.
You always reply with a single JSON object and nothing else."#;

const USER_INPUT_TEMPLATE: &str = r#"Learning Goals: {goals}
User Activity: {activity}

Suggest learning materials that will help the user achieve their learning goals, considering their past activity.
Provide a list of at least 3 suggestions. Each suggestion must include a clear title and a relevant, useful code snippet.
The code should be well-formatted and demonstrate a key concept.

Reply with JSON of exactly this shape:
{"suggestedMaterials": [{"title": "...", "code": "..."}]}"#;

/// Used when the learner has no recorded activity yet.
const NO_ACTIVITY: &str = "No previous activity recorded.";

pub fn render_prompt(request: &LearningPathRequest) -> String {
    let activity = if request.user_activity.trim().is_empty() {
        NO_ACTIVITY
    } else {
        request.user_activity.as_str()
    };
    fill_template(
        USER_INPUT_TEMPLATE,
        &[("goals", request.learning_goals.as_str()), ("activity", activity)],
    )
}

#[derive(Clone)]
pub struct OpenAiLearningPathAdapter {
    runner: PromptRunner,
}

impl OpenAiLearningPathAdapter {
    pub fn new(runner: PromptRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl LearningPathService for OpenAiLearningPathAdapter {
    async fn suggest_learning_path(
        &self,
        request: &LearningPathRequest,
    ) -> PortResult<LearningPathResult> {
        self.runner
            .run_json(
                "learning-path-suggestions",
                SYSTEM_INSTRUCTIONS,
                render_prompt(request),
                &[],
            )
            .await
    }
}
