//! crates/edusync_core/src/domain.rs
//!
//! Defines the core data structures for the application: the request and
//! result records of every prompt flow, plus the identity records.
//! Field names serialize in camelCase to match the flow schemas on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use uuid::Uuid;

use crate::images::is_image_data_url;
use crate::ports::{PortError, PortResult};

//=========================================================================================
// Limits
//=========================================================================================

pub const NOTES_COUNT_RANGE: RangeInclusive<u8> = 1..=20;
pub const QUIZ_COUNT_RANGE: RangeInclusive<u8> = 1..=10;
pub const DEFAULT_ITEM_COUNT: u8 = 5;
pub const MIN_TOPIC_LEN: usize = 3;
pub const MAX_IMAGES: usize = 5;
pub const OPTIONS_PER_QUESTION: usize = 4;
pub const MIN_LEARNING_GOALS_LEN: usize = 10;

/// Returned by the feedback flow when the learner made no mistakes.
pub const ALL_CORRECT_FEEDBACK: &str =
    "Excellent work! You answered all questions correctly. Keep up the great momentum!";

fn default_item_count() -> u8 {
    DEFAULT_ITEM_COUNT
}

//=========================================================================================
// Identity
//=========================================================================================

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub display_name: Option<String>,
}

impl UserCredentials {
    pub fn to_user(&self) -> User {
        User {
            user_id: self.user_id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Source Material
//=========================================================================================

/// What a generation prompt should draw its content from.
///
/// Supplied source text wins over images, and images win over the model's
/// general knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMaterial<'a> {
    Text(&'a str),
    Images(&'a [String]),
    GeneralKnowledge,
}

impl<'a> SourceMaterial<'a> {
    pub fn select(source_text: Option<&'a str>, image_urls: &'a [String]) -> Self {
        match source_text.map(str::trim) {
            Some(text) if !text.is_empty() => SourceMaterial::Text(text),
            _ if !image_urls.is_empty() => SourceMaterial::Images(image_urls),
            _ => SourceMaterial::GeneralKnowledge,
        }
    }
}

fn validate_subject_and_topic(subject: &str, topic: &str) -> PortResult<()> {
    if subject.trim().is_empty() {
        return Err(PortError::Validation("Subject is required.".to_string()));
    }
    if topic.trim().chars().count() < MIN_TOPIC_LEN {
        return Err(PortError::Validation(format!(
            "Topic must be at least {} characters.",
            MIN_TOPIC_LEN
        )));
    }
    Ok(())
}

fn validate_images(image_urls: &[String]) -> PortResult<()> {
    if image_urls.len() > MAX_IMAGES {
        return Err(PortError::Validation(format!(
            "You can only upload a maximum of {} images.",
            MAX_IMAGES
        )));
    }
    if let Some(bad) = image_urls.iter().position(|u| !is_image_data_url(u)) {
        return Err(PortError::Validation(format!(
            "Image {} is not a base64 image data URL.",
            bad + 1
        )));
    }
    Ok(())
}

fn validate_count(name: &str, count: u8, range: &RangeInclusive<u8>) -> PortResult<()> {
    if !range.contains(&count) {
        return Err(PortError::Validation(format!(
            "{} must be between {} and {}.",
            name,
            range.start(),
            range.end()
        )));
    }
    Ok(())
}

//=========================================================================================
// Notes
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesRequest {
    pub subject: String,
    pub topic: String,
    #[serde(default = "default_item_count")]
    pub notes_count: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl NotesRequest {
    pub fn validate(&self) -> PortResult<()> {
        validate_subject_and_topic(&self.subject, &self.topic)?;
        validate_count("Number of notes", self.notes_count, &NOTES_COUNT_RANGE)?;
        validate_images(&self.image_urls)
    }

    pub fn source(&self) -> SourceMaterial<'_> {
        SourceMaterial::select(self.source_text.as_deref(), &self.image_urls)
    }
}

/// A single flip card: the term on the front, the definition on the back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesResult {
    pub notes: Vec<Note>,
}

impl NotesResult {
    /// Trims a model reply down to the requested number of notes.
    /// A reply with fewer notes than requested, or with blank cards, is rejected.
    pub fn conform(mut self, expected: usize) -> PortResult<Self> {
        if self.notes.len() < expected {
            return Err(PortError::MalformedOutput(format!(
                "Expected {} notes but the model returned {}.",
                expected,
                self.notes.len()
            )));
        }
        self.notes.truncate(expected);
        if self
            .notes
            .iter()
            .any(|n| n.term.trim().is_empty() || n.definition.trim().is_empty())
        {
            return Err(PortError::MalformedOutput(
                "The model returned a note with an empty term or definition.".to_string(),
            ));
        }
        Ok(self)
    }
}

//=========================================================================================
// Quiz
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub subject: String,
    pub topic: String,
    #[serde(default = "default_item_count")]
    pub question_count: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
}

impl QuizRequest {
    pub fn validate(&self) -> PortResult<()> {
        validate_subject_and_topic(&self.subject, &self.topic)?;
        validate_count("Number of questions", self.question_count, &QUIZ_COUNT_RANGE)?;
        validate_images(&self.image_urls)
    }

    pub fn source(&self) -> SourceMaterial<'_> {
        SourceMaterial::select(self.source_text.as_deref(), &self.image_urls)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    fn check(&self, number: usize) -> PortResult<()> {
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(PortError::MalformedOutput(format!(
                "Question {} has {} options instead of {}.",
                number,
                self.options.len(),
                OPTIONS_PER_QUESTION
            )));
        }
        if !self.options.contains(&self.correct_answer) {
            return Err(PortError::MalformedOutput(format!(
                "Question {} has a correct answer that is not one of its options.",
                number
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub questions: Vec<QuizQuestion>,
}

impl QuizResult {
    /// Trims a model reply down to the requested number of questions and checks
    /// that every question has four options containing the correct answer.
    pub fn conform(mut self, expected: usize) -> PortResult<Self> {
        if self.questions.len() < expected {
            return Err(PortError::MalformedOutput(format!(
                "Expected {} questions but the model returned {}.",
                expected,
                self.questions.len()
            )));
        }
        self.questions.truncate(expected);
        for (i, question) in self.questions.iter().enumerate() {
            question.check(i + 1)?;
        }
        Ok(self)
    }
}

//=========================================================================================
// Feedback
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncorrectAnswer {
    pub question_text: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub subject: String,
    pub topic: String,
    pub incorrect_answers: Vec<IncorrectAnswer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub feedback: String,
}

//=========================================================================================
// Text Enhancement
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhanceRequest {
    pub text: String,
}

impl EnhanceRequest {
    pub fn validate(&self) -> PortResult<()> {
        if self.text.trim().is_empty() {
            return Err(PortError::Validation("There is no text to enhance.".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResult {
    pub enhanced_text: String,
}

//=========================================================================================
// Learning Path
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathRequest {
    pub learning_goals: String,
    #[serde(default)]
    pub user_activity: String,
}

impl LearningPathRequest {
    pub fn validate(&self) -> PortResult<()> {
        if self.learning_goals.trim().chars().count() < MIN_LEARNING_GOALS_LEN {
            return Err(PortError::Validation(format!(
                "Please describe your learning goals in at least {} characters.",
                MIN_LEARNING_GOALS_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedMaterial {
    pub title: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathResult {
    pub suggested_materials: Vec<SuggestedMaterial>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], correct: &str) -> QuizQuestion {
        QuizQuestion {
            question_text: "What is 2 + 2?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.to_string(),
            explanation: "Basic addition.".to_string(),
        }
    }

    fn note(term: &str) -> Note {
        Note {
            term: term.to_string(),
            definition: format!("{} explained", term),
        }
    }

    #[test]
    fn source_text_wins_over_images() {
        let images = vec!["data:image/png;base64,AAAA".to_string()];
        assert_eq!(
            SourceMaterial::select(Some("Term: Cell"), &images),
            SourceMaterial::Text("Term: Cell")
        );
        assert_eq!(
            SourceMaterial::select(Some("   "), &images),
            SourceMaterial::Images(&images)
        );
        assert_eq!(SourceMaterial::select(None, &[]), SourceMaterial::GeneralKnowledge);
    }

    #[test]
    fn notes_request_defaults_count_and_checks_bounds() {
        let req: NotesRequest =
            serde_json::from_str(r#"{"subject":"History","topic":"Apartheid"}"#).unwrap();
        assert_eq!(req.notes_count, 5);
        assert!(req.validate().is_ok());

        let too_many = NotesRequest { notes_count: 21, ..req.clone() };
        assert!(matches!(too_many.validate(), Err(PortError::Validation(_))));

        let short_topic = NotesRequest { topic: "ab".to_string(), ..req };
        assert!(matches!(short_topic.validate(), Err(PortError::Validation(_))));
    }

    #[test]
    fn quiz_request_rejects_non_image_urls() {
        let req = QuizRequest {
            subject: "Geography".to_string(),
            topic: "Plate Tectonics".to_string(),
            question_count: 3,
            image_urls: vec!["https://example.com/a.png".to_string()],
            source_text: None,
        };
        assert!(matches!(req.validate(), Err(PortError::Validation(_))));
    }

    #[test]
    fn notes_conform_truncates_surplus_and_rejects_shortfall() {
        let result = NotesResult {
            notes: vec![note("Mitosis"), note("Meiosis"), note("Osmosis")],
        };
        let trimmed = result.clone().conform(2).unwrap();
        assert_eq!(trimmed.notes.len(), 2);
        assert_eq!(trimmed.notes[1].term, "Meiosis");

        assert!(result.conform(4).is_err());
    }

    #[test]
    fn quiz_conform_enforces_four_options_with_correct_answer() {
        let good = question(&["3", "4", "5", "6"], "4");
        let ok = QuizResult { questions: vec![good.clone()] }.conform(1).unwrap();
        assert_eq!(ok.questions.len(), 1);

        let three_options = question(&["3", "4", "5"], "4");
        assert!(QuizResult { questions: vec![three_options] }.conform(1).is_err());

        let stray_answer = question(&["3", "4", "5", "6"], "22");
        assert!(QuizResult { questions: vec![good, stray_answer] }.conform(2).is_err());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::to_value(QuizQuestion {
            question_text: "Q".to_string(),
            options: vec![],
            correct_answer: "A".to_string(),
            explanation: "E".to_string(),
        })
        .unwrap();
        assert!(json.get("questionText").is_some());
        assert!(json.get("correctAnswer").is_some());
    }
}
