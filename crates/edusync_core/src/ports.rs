//! crates/edusync_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! The identity provider and each generative-AI flow sit behind one of these
//! ports, so the core never depends on a concrete database or model API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    EnhanceRequest, EnhanceResult, FeedbackRequest, FeedbackResult, LearningPathRequest,
    LearningPathResult, NotesRequest, NotesResult, QuizRequest, QuizResult, User,
    UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// Caller-supplied input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The model replied, but its reply does not fit the output schema.
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email address already in use")]
    EmailInUse,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Identity Provider
//=========================================================================================

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Fails with `PortError::EmailInUse` when the address is taken.
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn update_display_name(&self, user_id: Uuid, display_name: &str) -> PortResult<User>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user, or `PortError::Unauthorized` for unknown or expired sessions.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

//=========================================================================================
// Prompt Flows
//=========================================================================================

#[async_trait]
pub trait NotesGenerationService: Send + Sync {
    /// Generates flip-card notes for a subject and topic.
    async fn generate_notes(&self, request: &NotesRequest) -> PortResult<NotesResult>;
}

#[async_trait]
pub trait QuizGenerationService: Send + Sync {
    /// Generates a multiple-choice quiz for a subject and topic.
    async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<QuizResult>;
}

#[async_trait]
pub trait QuizFeedbackService: Send + Sync {
    /// Produces advice from a non-empty list of incorrect answers.
    async fn generate_feedback(&self, request: &FeedbackRequest) -> PortResult<FeedbackResult>;
}

#[async_trait]
pub trait TextEnhancementService: Send + Sync {
    async fn enhance_text(&self, request: &EnhanceRequest) -> PortResult<EnhanceResult>;
}

#[async_trait]
pub trait LearningPathService: Send + Sync {
    async fn suggest_learning_path(
        &self,
        request: &LearningPathRequest,
    ) -> PortResult<LearningPathResult>;
}
