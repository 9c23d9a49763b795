//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup, login, logout and the signed-in
//! user's profile.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use edusync_core::domain::User;
use edusync_core::forms::{AuthForm, LoginForm, ProfileUpdate, SignupForm};
use edusync_core::ports::PortError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{auth_failure, GENERIC_AUTH_ERROR};
use crate::web::middleware::session_cookie;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<User> for AuthResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            display_name: user.display_name,
        }
    }
}

type AuthResult<T> = Result<T, (StatusCode, String)>;

//=========================================================================================
// Shared Steps
//=========================================================================================

fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_AUTH_ERROR.to_string())
        })
}

fn verify_password(password: &str, hashed_password: &str) -> AuthResult<()> {
    let parsed_hash = PasswordHash::new(hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_AUTH_ERROR.to_string())
    })?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| auth_failure(&PortError::InvalidCredentials))
}

/// A remembered login survives browser restarts; otherwise the cookie has no
/// `Max-Age` and ends with the browser session.
fn session_cookie_header(auth_session_id: &str, remember: bool, days: i64) -> String {
    let mut cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/",
        auth_session_id
    );
    if remember {
        cookie.push_str(&format!("; Max-Age={}", Duration::days(days).num_seconds()));
    }
    cookie
}

async fn start_session(
    state: &AppState,
    user: User,
    remember: bool,
    status: StatusCode,
) -> AuthResult<impl IntoResponse> {
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(state.config.session_days);

    state
        .identity
        .create_auth_session(&auth_session_id, user.user_id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            auth_failure(&e)
        })?;

    let cookie = session_cookie_header(&auth_session_id, remember, state.config.session_days);
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(user)),
    ))
}

async fn sign_up(state: &AppState, form: SignupForm) -> AuthResult<impl IntoResponse> {
    form.validate().map_err(|e| auth_failure(&e))?;
    let password_hash = hash_password(&form.password)?;

    let user = state
        .identity
        .create_user(&form.email, &password_hash, &form.display_name())
        .await
        .map_err(|e| {
            error!("Failed to create user: {:?}", e);
            auth_failure(&e)
        })?;
    info!(user_id = %user.user_id, "New account created.");

    start_session(state, user, form.remember, StatusCode::CREATED).await
}

async fn log_in(state: &AppState, form: LoginForm) -> AuthResult<impl IntoResponse> {
    form.validate().map_err(|e| auth_failure(&e))?;

    let user_creds = state
        .identity
        .get_user_by_email(&form.email)
        .await
        .map_err(|e| {
            error!("Failed to get user: {:?}", e);
            auth_failure(&e)
        })?;
    verify_password(&form.password, &user_creds.hashed_password)?;

    start_session(state, user_creds.to_user(), form.remember, StatusCode::OK).await
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth - Log in or sign up, chosen by the form's `mode`
#[utoipa::path(
    post,
    path = "/auth",
    request_body(content_type = "application/json", description = "`{\"mode\": \"login\" | \"signup\", ...}`"),
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Form validation failed"),
        (status = 401, description = "Invalid email or password"),
        (status = 409, description = "Email address already in use")
    )
)]
pub async fn auth_handler(
    State(state): State<Arc<AppState>>,
    Json(form): Json<AuthForm>,
) -> AuthResult<axum::response::Response> {
    match form {
        AuthForm::Login(form) => log_in(&state, form).await.map(IntoResponse::into_response),
        AuthForm::Signup(form) => sign_up(&state, form).await.map(IntoResponse::into_response),
    }
}

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body(content_type = "application/json", description = "name, surname, email, password, remember"),
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email address already in use"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SignupForm>,
) -> AuthResult<impl IntoResponse> {
    sign_up(&state, form).await
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(content_type = "application/json", description = "email, password, remember"),
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LoginForm>,
) -> AuthResult<impl IntoResponse> {
    log_in(&state, form).await
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    let auth_session_id = session_cookie(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .identity
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
        })?;

    // Live quiz sockets for this login close with a redirect.
    state.sessions.sign_out(auth_session_id);

    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}

/// GET /api/me - The signed-in user
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = AuthResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> AuthResult<Json<AuthResponse>> {
    let user = state.identity.get_user(user_id).await.map_err(|e| {
        error!("Failed to load user {}: {:?}", user_id, e);
        auth_failure(&e)
    })?;
    Ok(Json(user.into()))
}

/// PUT /api/me/profile - Change the display name
#[utoipa::path(
    put,
    path = "/api/me/profile",
    request_body(content_type = "application/json", description = "`{\"displayName\": \"...\"}`"),
    responses(
        (status = 200, description = "Profile updated", body = AuthResponse),
        (status = 400, description = "Display name too short"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> AuthResult<Json<AuthResponse>> {
    update.validate().map_err(|e| auth_failure(&e))?;
    let user = state
        .identity
        .update_display_name(user_id, update.display_name.trim())
        .await
        .map_err(|e| {
            error!("Failed to update profile for {}: {:?}", user_id, e);
            auth_failure(&e)
        })?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembered_sessions_persist() {
        let cookie = session_cookie_header("abc", true, 30);
        assert!(cookie.starts_with("session=abc; HttpOnly"));
        assert!(cookie.ends_with("; Max-Age=2592000"));
    }

    #[test]
    fn unremembered_sessions_end_with_the_browser() {
        let cookie = session_cookie_header("abc", false, 30);
        assert!(!cookie.contains("Max-Age"));
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        let (status, message) = verify_password("battery staple", &hash).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Invalid email or password.");
    }
}
