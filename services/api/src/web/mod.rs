pub mod auth;
pub mod middleware;
pub mod protocol;
pub mod quiz_timer;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use auth::{
    auth_handler, login_handler, logout_handler, me_handler, signup_handler,
    update_profile_handler,
};
use middleware::{require_auth, require_page_session};
use rest::{
    dashboard_handler, enhance_handler, feedback_handler, learning_path_handler,
    list_subjects_handler, notes_handler, notes_to_quiz_handler, quiz_handler,
    quiz_to_notes_handler, score_handler, subject_page_handler, upload_images_handler,
};
use state::AppState;
pub use ws_handler::quiz_ws_handler;

/// Builds every route of the service. CORS and the Swagger UI are layered
/// on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth", post(auth_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // API routes answer 401 without a valid session
    let api_routes = Router::new()
        .route("/api/me", get(me_handler))
        .route("/api/me/profile", put(update_profile_handler))
        .route("/api/subjects", get(list_subjects_handler))
        .route("/api/flows/notes", post(notes_handler))
        .route("/api/flows/quiz", post(quiz_handler))
        .route("/api/flows/feedback", post(feedback_handler))
        .route("/api/flows/enhance", post(enhance_handler))
        .route("/api/flows/learning-path", post(learning_path_handler))
        .route("/api/quiz/score", post(score_handler))
        .route("/api/study/notes-to-quiz", post(notes_to_quiz_handler))
        .route("/api/study/quiz-to-notes", post(quiz_to_notes_handler))
        .route("/api/uploads/images", post(upload_images_handler))
        .route("/ws/quiz", get(quiz_ws_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Dashboard pages redirect to the login route instead
    let page_routes = Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/dashboard/subjects/{slug}", get(subject_page_handler))
        .route("/dashboard/subjects/{slug}/study", get(subject_page_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_page_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(page_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(app_state)
}
