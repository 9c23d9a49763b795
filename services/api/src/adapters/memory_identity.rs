//! services/api/src/adapters/memory_identity.rs
//!
//! An `IdentityService` kept entirely in process memory. Used when no
//! `DATABASE_URL` is configured, and by the router tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edusync_core::domain::{AuthSession, User, UserCredentials};
use edusync_core::forms::normalize_email;
use edusync_core::ports::{IdentityService, PortError, PortResult};
use uuid::Uuid;

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, UserCredentials>,
    sessions: HashMap<String, AuthSession>,
}

#[derive(Default)]
pub struct InMemoryIdentityStore {
    inner: Mutex<Store>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> PortResult<MutexGuard<'_, Store>> {
        self.inner
            .lock()
            .map_err(|_| PortError::Unexpected("identity store lock poisoned".to_string()))
    }
}

#[async_trait]
impl IdentityService for InMemoryIdentityStore {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
        display_name: &str,
    ) -> PortResult<User> {
        let email = normalize_email(email);
        let mut store = self.store()?;
        if store.users.values().any(|u| u.email == email) {
            return Err(PortError::EmailInUse);
        }
        let credentials = UserCredentials {
            user_id: Uuid::new_v4(),
            email,
            hashed_password: hashed_password.to_string(),
            display_name: Some(display_name.to_string()).filter(|n| !n.trim().is_empty()),
        };
        let user = credentials.to_user();
        store.users.insert(user.user_id, credentials);
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let email = normalize_email(email);
        self.store()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.store()?
            .users
            .get(&user_id)
            .map(UserCredentials::to_user)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn update_display_name(&self, user_id: Uuid, display_name: &str) -> PortResult<User> {
        let mut store = self.store()?;
        let credentials = store
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        credentials.display_name = Some(display_name.to_string());
        Ok(credentials.to_user())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let session = AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        };
        let mut store = self.store()?;
        let now = Utc::now();
        store.sessions.retain(|_, s| s.expires_at > now);
        store.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let mut store = self.store()?;
        match store.sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            Some(_) => {
                store.sessions.remove(session_id);
                Err(PortError::Unauthorized)
            }
            None => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.store()?.sessions.remove(session_id);
        Ok(())
    }
}
