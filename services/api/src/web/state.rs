//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry of per-login auth
//! gates that live quiz sockets subscribe to.

use crate::config::Config;
use edusync_core::auth_gate::AuthGate;
use edusync_core::ports::{
    IdentityService, LearningPathService, NotesGenerationService, QuizFeedbackService,
    QuizGenerationService, TextEnhancementService,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tracing::{info, warn};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityService>,
    pub config: Arc<Config>,
    pub notes_adapter: Arc<dyn NotesGenerationService>,
    pub quiz_adapter: Arc<dyn QuizGenerationService>,
    pub feedback_adapter: Arc<dyn QuizFeedbackService>,
    pub enhance_adapter: Arc<dyn TextEnhancementService>,
    pub learning_path_adapter: Arc<dyn LearningPathService>,
    pub sessions: Arc<SessionHub>,
}

//=========================================================================================
// SessionHub (One AuthGate per Login)
//=========================================================================================

/// Maps an auth session id (the cookie value) to the gate its sockets watch.
///
/// Entries are weak: a gate lives only as long as some connection holds it.
#[derive(Default)]
pub struct SessionHub {
    gates: Mutex<HashMap<String, Weak<AuthGate>>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live gate for this login, creating one in `Loading` if needed.
    pub fn gate_for(&self, auth_session_id: &str) -> Arc<AuthGate> {
        let mut gates = match self.gates.lock() {
            Ok(gates) => gates,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(gate) = gates.get(auth_session_id).and_then(Weak::upgrade) {
            return gate;
        }
        gates.retain(|_, gate| gate.strong_count() > 0);
        let gate = Arc::new(AuthGate::new());
        gates.insert(auth_session_id.to_string(), Arc::downgrade(&gate));
        gate
    }

    /// Publishes `Unauthenticated` to everyone watching this login.
    pub fn sign_out(&self, auth_session_id: &str) {
        let gate = match self.gates.lock() {
            Ok(mut gates) => gates.remove(auth_session_id).and_then(|gate| gate.upgrade()),
            Err(_) => {
                warn!("Session hub lock poisoned; skipping sign-out broadcast.");
                None
            }
        };
        if let Some(gate) = gate {
            info!(
                subscribers = gate.subscriber_count(),
                "Broadcasting sign-out to live connections."
            );
            gate.sign_out();
        }
    }

    pub fn live_gates(&self) -> usize {
        self.gates
            .lock()
            .map(|gates| gates.values().filter(|g| g.strong_count() > 0).count())
            .unwrap_or(0)
    }
}
