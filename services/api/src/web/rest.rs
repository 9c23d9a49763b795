//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::flow_failure;
use crate::web::{auth, state::AppState};
use axum::{
    extract::{Multipart, Path, Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use edusync_core::convert::StudyLink;
use edusync_core::domain::{
    EnhanceRequest, EnhanceResult, FeedbackRequest, FeedbackResult, IncorrectAnswer,
    LearningPathRequest, LearningPathResult, NotesRequest, NotesResult, QuizRequest, QuizResult,
    User,
};
use edusync_core::images::{accept_uploads, ImageUpload, UploadReport};
use edusync_core::ports::PortError;
use edusync_core::quiz::{incorrect_answers, Score, ScoreTier, UserAnswers};
use edusync_core::{flows, subjects};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::auth_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        auth::update_profile_handler,
        list_subjects_handler,
        notes_handler,
        quiz_handler,
        feedback_handler,
        enhance_handler,
        learning_path_handler,
        score_handler,
        notes_to_quiz_handler,
        quiz_to_notes_handler,
        upload_images_handler,
    ),
    components(
        schemas(auth::AuthResponse, SubjectView, LinkResponse)
    ),
    tags(
        (name = "EduSync API", description = "Study aids for South African school subjects: notes, quizzes and feedback.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectView {
    pub name: String,
    pub slug: String,
    pub href: String,
    pub topic_placeholder: String,
}

impl From<&subjects::Subject> for SubjectView {
    fn from(subject: &subjects::Subject) -> Self {
        Self {
            name: subject.name.to_string(),
            slug: subject.slug.to_string(),
            href: format!("/dashboard/subjects/{}", subject.slug),
            topic_placeholder: subjects::topic_placeholder(subject.name).to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct ScoreRequest {
    pub quiz: QuizResult,
    #[serde(default)]
    pub answers: UserAnswers,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    pub score: Score,
    pub tier: ScoreTier,
    pub incorrect: Vec<IncorrectAnswer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesToQuizRequest {
    pub subject_slug: String,
    pub topic: String,
    pub notes: NotesResult,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizToNotesRequest {
    pub subject_slug: String,
    pub topic: String,
    pub quiz: QuizResult,
}

/// A cross-link to the other study tab, both as data and as a ready URL.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    #[schema(value_type = Object)]
    pub link: StudyLink,
    pub query: String,
    pub path: String,
}

impl From<StudyLink> for LinkResponse {
    fn from(link: StudyLink) -> Self {
        Self {
            query: link.query(),
            path: link.path(),
            link,
        }
    }
}

#[derive(Deserialize)]
pub struct UploadParams {
    /// Images the learner already has attached to the form.
    #[serde(default)]
    pub held: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub greeting: String,
    pub user: User,
    pub subjects: Vec<SubjectView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPageView {
    pub subject_name: String,
    pub subject_slug: String,
    pub topic_placeholder: String,
    /// Prefilled generator input read from the page's query string.
    pub prefill: StudyLink,
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

//=========================================================================================
// Flow Handlers
//=========================================================================================

/// Generate flip-card notes.
#[utoipa::path(
    post,
    path = "/api/flows/notes",
    request_body(content_type = "application/json", description = "subject, topic, notesCount (1-20), imageUrls, sourceText"),
    responses(
        (status = 200, description = "`{\"notes\": [{\"term\", \"definition\"}]}`"),
        (status = 422, description = "Invalid request"),
        (status = 502, description = "Could not generate notes")
    )
)]
pub async fn notes_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<NotesRequest>,
) -> ApiResult<Json<NotesResult>> {
    flows::generate_notes(app_state.notes_adapter.as_ref(), &request)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Notes generation failed: {:?}", e);
            flow_failure("notes", &e)
        })
}

/// Generate a multiple-choice quiz.
#[utoipa::path(
    post,
    path = "/api/flows/quiz",
    request_body(content_type = "application/json", description = "subject, topic, questionCount (1-10), imageUrls, sourceText"),
    responses(
        (status = 200, description = "`{\"questions\": [{\"questionText\", \"options\", \"correctAnswer\", \"explanation\"}]}`"),
        (status = 422, description = "Invalid request"),
        (status = 502, description = "Could not generate a quiz")
    )
)]
pub async fn quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<QuizRequest>,
) -> ApiResult<Json<QuizResult>> {
    flows::generate_quiz(app_state.quiz_adapter.as_ref(), &request)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Quiz generation failed: {:?}", e);
            flow_failure("a quiz", &e)
        })
}

/// Advice on a learner's incorrect answers.
#[utoipa::path(
    post,
    path = "/api/flows/feedback",
    request_body(content_type = "application/json", description = "subject, topic, incorrectAnswers"),
    responses(
        (status = 200, description = "`{\"feedback\": \"...\"}`"),
        (status = 502, description = "Could not generate feedback")
    )
)]
pub async fn feedback_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<Json<FeedbackResult>> {
    flows::generate_feedback(app_state.feedback_adapter.as_ref(), &request)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Feedback generation failed: {:?}", e);
            flow_failure("feedback", &e)
        })
}

/// Rewrite selected text to be clearer.
#[utoipa::path(
    post,
    path = "/api/flows/enhance",
    request_body(content_type = "application/json", description = "`{\"text\": \"...\"}`"),
    responses(
        (status = 200, description = "`{\"enhancedText\": \"...\"}`"),
        (status = 422, description = "Empty text"),
        (status = 502, description = "Could not generate enhanced text")
    )
)]
pub async fn enhance_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<EnhanceRequest>,
) -> ApiResult<Json<EnhanceResult>> {
    flows::enhance_text(app_state.enhance_adapter.as_ref(), &request)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Text enhancement failed: {:?}", e);
            flow_failure("enhanced text", &e)
        })
}

#[utoipa::path(
    post,
    path = "/api/flows/learning-path",
    request_body(content_type = "application/json", description = "learningGoals, userActivity"),
    responses(
        (status = 200, description = "`{\"suggestedMaterials\": [{\"title\", \"code\"}]}`"),
        (status = 422, description = "Learning goals too short"),
        (status = 502, description = "Could not generate learning path suggestions")
    )
)]
pub async fn learning_path_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<LearningPathRequest>,
) -> ApiResult<Json<LearningPathResult>> {
    flows::suggest_learning_path(app_state.learning_path_adapter.as_ref(), &request)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Learning path suggestion failed: {:?}", e);
            flow_failure("learning path suggestions", &e)
        })
}

//=========================================================================================
// Study Helpers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/subjects",
    responses((status = 200, description = "The subject catalog", body = [SubjectView]))
)]
pub async fn list_subjects_handler() -> Json<Vec<SubjectView>> {
    Json(subjects::SUBJECTS.iter().map(SubjectView::from).collect())
}

/// Score an answer map against a quiz.
#[utoipa::path(
    post,
    path = "/api/quiz/score",
    request_body(content_type = "application/json", description = "`{\"quiz\": {...}, \"answers\": {\"0\": \"...\"}}`"),
    responses((status = 200, description = "score, tier and the incorrect answers"))
)]
pub async fn score_handler(Json(request): Json<ScoreRequest>) -> Json<ScoreResponse> {
    let score = Score::calculate(&request.quiz, &request.answers);
    Json(ScoreResponse {
        score,
        tier: score.tier(),
        incorrect: incorrect_answers(&request.quiz, &request.answers),
    })
}

#[utoipa::path(
    post,
    path = "/api/study/notes-to-quiz",
    request_body(content_type = "application/json", description = "subjectSlug, topic, notes"),
    responses(
        (status = 200, description = "Link to the quiz tab", body = LinkResponse),
        (status = 422, description = "No notes to convert")
    )
)]
pub async fn notes_to_quiz_handler(
    Json(request): Json<NotesToQuizRequest>,
) -> ApiResult<Json<LinkResponse>> {
    StudyLink::quiz_from_notes(&request.subject_slug, &request.topic, &request.notes)
        .map(|link| Json(link.into()))
        .map_err(|e| flow_failure("a quiz", &e))
}

#[utoipa::path(
    post,
    path = "/api/study/quiz-to-notes",
    request_body(content_type = "application/json", description = "subjectSlug, topic, quiz"),
    responses(
        (status = 200, description = "Link to the notes tab", body = LinkResponse),
        (status = 422, description = "No questions to convert")
    )
)]
pub async fn quiz_to_notes_handler(
    Json(request): Json<QuizToNotesRequest>,
) -> ApiResult<Json<LinkResponse>> {
    StudyLink::notes_from_quiz(&request.subject_slug, &request.topic, &request.quiz)
        .map(|link| Json(link.into()))
        .map_err(|e| flow_failure("notes", &e))
}

/// Encode uploaded images as data URLs for a later generation request.
///
/// Nothing is stored. The `held` query parameter counts images the form
/// already carries so the limit applies to the total.
#[utoipa::path(
    post,
    path = "/api/uploads/images",
    request_body(content_type = "multipart/form-data", description = "One or more image files."),
    params(("held" = Option<usize>, Query, description = "Images already attached")),
    responses(
        (status = 200, description = "`{\"imageUrls\": [...], \"skipped\": [...]}`"),
        (status = 400, description = "Too many images or unreadable upload")
    )
)]
pub async fn upload_images_handler(
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadReport>> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let file_name = field.file_name().unwrap_or("untitled").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        uploads.push(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    let report = accept_uploads(params.held, uploads).map_err(|e| match e {
        PortError::Validation(message) => (StatusCode::BAD_REQUEST, message),
        other => {
            error!("Image upload failed: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not read the uploaded images.".to_string(),
            )
        }
    })?;
    if !report.skipped.is_empty() {
        warn!(skipped = report.skipped.len(), "Skipped non-image uploads.");
    }
    info!(accepted = report.image_urls.len(), "Encoded image uploads.");
    Ok(Json(report))
}

//=========================================================================================
// Dashboard Pages (behind the page gate)
//=========================================================================================

pub async fn dashboard_handler(Extension(user): Extension<User>) -> impl IntoResponse {
    let greeting = match &user.display_name {
        Some(name) => format!("Welcome back, {}!", name),
        None => format!("Welcome back, {}!", user.email),
    };
    Json(DashboardView {
        greeting,
        user,
        subjects: subjects::SUBJECTS.iter().map(SubjectView::from).collect(),
    })
}

/// Serves both the subject page and its `/study` view; the query string
/// carries any cross-linked prefill.
pub async fn subject_page_handler(
    Path(slug): Path<String>,
    RawQuery(query): RawQuery,
) -> Json<SubjectPageView> {
    let subject_name = subjects::find(&slug)
        .map(|s| s.name.to_string())
        .unwrap_or_else(|| subjects::display_name(&slug));
    let topic_placeholder = subjects::topic_placeholder(&subject_name).to_string();
    let prefill = StudyLink::from_query(&slug, query.as_deref().unwrap_or_default());
    Json(SubjectPageView {
        subject_name,
        subject_slug: slug,
        topic_placeholder,
        prefill,
    })
}
