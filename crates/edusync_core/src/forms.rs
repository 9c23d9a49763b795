//! crates/edusync_core/src/forms.rs
//!
//! Login and signup forms. They share an endpoint slot, so they are modelled
//! as one enum tagged by `mode`, each variant with its own field set.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::ports::{PortError, PortResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

fn check_email(email: &str) -> PortResult<()> {
    if !email_regex().is_match(email.trim()) {
        return Err(PortError::Validation("Invalid email address.".to_string()));
    }
    Ok(())
}

fn check_password(password: &str) -> PortResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PortError::Validation(format!(
            "Password must be at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn check_name(label: &str, value: &str) -> PortResult<()> {
    if value.trim().chars().count() < MIN_NAME_LEN {
        return Err(PortError::Validation(format!(
            "{} must be at least {} characters.",
            label, MIN_NAME_LEN
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Keep the session cookie across browser restarts.
    #[serde(default = "remember_by_default")]
    pub remember: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    #[serde(default = "remember_by_default")]
    pub remember: bool,
}

fn remember_by_default() -> bool {
    true
}

impl LoginForm {
    pub fn validate(&self) -> PortResult<()> {
        check_email(&self.email)?;
        check_password(&self.password)
    }
}

impl SignupForm {
    pub fn validate(&self) -> PortResult<()> {
        check_name("Name", &self.name)?;
        check_name("Surname", &self.surname)?;
        check_email(&self.email)?;
        check_password(&self.password)
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.name.trim(), self.surname.trim())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthForm {
    Login(LoginForm),
    Signup(SignupForm),
}

impl AuthForm {
    pub fn validate(&self) -> PortResult<()> {
        match self {
            AuthForm::Login(form) => form.validate(),
            AuthForm::Signup(form) => form.validate(),
        }
    }

    pub fn email(&self) -> &str {
        match self {
            AuthForm::Login(form) => &form.email,
            AuthForm::Signup(form) => &form.email,
        }
    }

    pub fn remember(&self) -> bool {
        match self {
            AuthForm::Login(form) => form.remember,
            AuthForm::Signup(form) => form.remember,
        }
    }
}

/// Normalized form of an email address used as the identity key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Profile edits: only the display name can change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: String,
}

impl ProfileUpdate {
    pub fn validate(&self) -> PortResult<()> {
        check_name("Display name", &self.display_name)
    }
}
