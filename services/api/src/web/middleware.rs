//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.
//!
//! API routes answer 401; dashboard pages go through the auth gate and
//! redirect to the login route instead.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use edusync_core::auth_gate::{decide, AuthState, GateDecision};
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::state::AppState;

/// The raw auth session id from the cookie, stored in request extensions
/// next to the user id.
#[derive(Debug, Clone)]
pub struct AuthSessionId(pub String);

/// Reads the `session` cookie value, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|id| !id.is_empty())
}

/// Middleware that validates the auth session cookie and extracts the user_id.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_session_id = session_cookie(req.headers())
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    let user_id = state
        .identity
        .validate_auth_session(&auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to validate auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(user_id);
    req.extensions_mut().insert(AuthSessionId(auth_session_id));
    Ok(next.run(req).await)
}

/// Resolves the cookie to a gate state. Anything short of a valid session
/// and an existing user is `Unauthenticated`.
pub async fn resolve_auth_state(state: &AppState, headers: &HeaderMap) -> AuthState {
    let Some(auth_session_id) = session_cookie(headers) else {
        return AuthState::Unauthenticated;
    };
    let user = async {
        let user_id = state.identity.validate_auth_session(auth_session_id).await?;
        state.identity.get_user(user_id).await
    }
    .await;
    match user {
        Ok(user) => AuthState::Authenticated(user),
        Err(e) => {
            warn!("Page request with unusable session: {:?}", e);
            AuthState::Unauthenticated
        }
    }
}

/// Gate for dashboard pages: render for a signed-in user, otherwise redirect
/// to the login route before any protected content is produced.
pub async fn require_page_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let auth_state = resolve_auth_state(&state, req.headers()).await;
    match decide(&auth_state, req.uri().path()) {
        GateDecision::Render => {
            if let AuthState::Authenticated(user) = auth_state {
                req.extensions_mut().insert(user);
            }
            next.run(req).await
        }
        GateDecision::Redirect(to) => Redirect::to(to).into_response(),
        GateDecision::ShowLoading => {
            (StatusCode::SERVICE_UNAVAILABLE, "Loading...").into_response()
        }
    }
}
