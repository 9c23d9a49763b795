//! crates/edusync_core/src/auth_gate.rs
//!
//! The auth gate: a single provider object holding the session state
//! (loading, authenticated, unauthenticated) that callers subscribe to instead
//! of querying the identity provider themselves, plus the routing decision
//! for protected pages.

use tokio::sync::watch;

use crate::domain::User;

pub const LOGIN_ROUTE: &str = "/";
pub const DASHBOARD_ROUTE: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Authenticated(User),
    Unauthenticated,
}

/// What a protected area should do for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    ShowLoading,
    Render,
    Redirect(&'static str),
}

/// The dashboard and everything below it require a signed-in user.
pub fn is_protected(path: &str) -> bool {
    path == DASHBOARD_ROUTE || path.starts_with("/dashboard/")
}

pub fn decide(state: &AuthState, path: &str) -> GateDecision {
    if !is_protected(path) {
        return GateDecision::Render;
    }
    match state {
        AuthState::Loading => GateDecision::ShowLoading,
        AuthState::Authenticated(_) => GateDecision::Render,
        AuthState::Unauthenticated => GateDecision::Redirect(LOGIN_ROUTE),
    }
}

//=========================================================================================
// Provider
//=========================================================================================

#[derive(Debug)]
pub struct AuthGate {
    tx: watch::Sender<AuthState>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthGate {
    /// Starts in `Loading` until the session has been resolved.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AuthState::Loading);
        Self { tx }
    }

    pub fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn resolve(&self, state: AuthState) {
        self.tx.send_replace(state);
    }

    pub fn sign_out(&self) {
        self.resolve(AuthState::Unauthenticated);
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live view of an `AuthGate`. Dropping it (or calling `unsubscribe`) ends
/// the subscription.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: watch::Receiver<AuthState>,
}

impl AuthSubscription {
    pub fn current(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    /// Waits for the next state change. Returns `None` once the gate is gone.
    pub async fn changed(&mut self) -> Option<AuthState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}
