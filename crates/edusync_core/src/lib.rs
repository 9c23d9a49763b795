pub mod auth_gate;
pub mod convert;
pub mod domain;
pub mod flows;
pub mod forms;
pub mod images;
pub mod ports;
pub mod quiz;
pub mod selection;
pub mod subjects;

pub use auth_gate::{AuthGate, AuthState, AuthSubscription, GateDecision};
pub use convert::{notes_to_source_text, quiz_to_source_text, StudyLink, StudyTab};
pub use domain::{
    AuthSession, EnhanceRequest, EnhanceResult, FeedbackRequest, FeedbackResult,
    IncorrectAnswer, LearningPathRequest, LearningPathResult, Note, NotesRequest, NotesResult,
    QuizQuestion, QuizRequest, QuizResult, SourceMaterial, User, UserCredentials,
};
pub use forms::{AuthForm, LoginForm, ProfileUpdate, SignupForm};
pub use ports::{
    IdentityService, LearningPathService, NotesGenerationService, PortError, PortResult,
    QuizFeedbackService, QuizGenerationService, TextEnhancementService,
};
pub use quiz::{QuizAttempt, QuizDuration, QuizOutcome, Score, ScoreTier, SubmitKind, UserAnswers};
