//! crates/edusync_core/src/flows.rs
//!
//! Validated entry points for the prompt flows. Each function checks its input
//! before calling the port and checks the port's output before returning it,
//! so adapters only have to talk to the model.

use tracing::info;

use crate::domain::{
    EnhanceRequest, EnhanceResult, FeedbackRequest, FeedbackResult, LearningPathRequest,
    LearningPathResult, NotesRequest, NotesResult, QuizRequest, QuizResult,
    ALL_CORRECT_FEEDBACK,
};
use crate::ports::{
    LearningPathService, NotesGenerationService, PortError, PortResult, QuizFeedbackService,
    QuizGenerationService, TextEnhancementService,
};

pub async fn generate_notes(
    service: &dyn NotesGenerationService,
    request: &NotesRequest,
) -> PortResult<NotesResult> {
    request.validate()?;
    let result = service.generate_notes(request).await?;
    result.conform(usize::from(request.notes_count))
}

pub async fn generate_quiz(
    service: &dyn QuizGenerationService,
    request: &QuizRequest,
) -> PortResult<QuizResult> {
    request.validate()?;
    let result = service.generate_quiz(request).await?;
    result.conform(usize::from(request.question_count))
}

/// Returns the fixed congratulation without touching the backend when there
/// are no incorrect answers.
pub async fn generate_feedback(
    service: &dyn QuizFeedbackService,
    request: &FeedbackRequest,
) -> PortResult<FeedbackResult> {
    if request.incorrect_answers.is_empty() {
        info!("No incorrect answers; skipping the feedback model.");
        return Ok(FeedbackResult {
            feedback: ALL_CORRECT_FEEDBACK.to_string(),
        });
    }
    let result = service.generate_feedback(request).await?;
    if result.feedback.trim().is_empty() {
        return Err(PortError::MalformedOutput(
            "The model returned empty feedback.".to_string(),
        ));
    }
    Ok(result)
}

pub async fn enhance_text(
    service: &dyn TextEnhancementService,
    request: &EnhanceRequest,
) -> PortResult<EnhanceResult> {
    request.validate()?;
    let result = service.enhance_text(request).await?;
    if result.enhanced_text.trim().is_empty() {
        return Err(PortError::MalformedOutput(
            "The model returned no enhanced text.".to_string(),
        ));
    }
    Ok(result)
}

pub async fn suggest_learning_path(
    service: &dyn LearningPathService,
    request: &LearningPathRequest,
) -> PortResult<LearningPathResult> {
    request.validate()?;
    let result = service.suggest_learning_path(request).await?;
    if result.suggested_materials.is_empty() {
        return Err(PortError::MalformedOutput(
            "The model returned no learning materials.".to_string(),
        ));
    }
    Ok(result)
}
