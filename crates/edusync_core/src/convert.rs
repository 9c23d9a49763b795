//! crates/edusync_core/src/convert.rs
//!
//! Cross-linking between the notes and quiz tools. A finished result is
//! rewritten as plain source text and handed to the other tool through the
//! study page's query parameters (`topic`, `sourceText`, `tab`).

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::domain::{NotesResult, QuizResult};
use crate::ports::{PortError, PortResult};

/// Serializes notes as "Term:/Definition:" blocks separated by blank lines.
pub fn notes_to_source_text(notes: &NotesResult) -> String {
    notes
        .notes
        .iter()
        .map(|n| format!("Term: {}\nDefinition: {}", n.term.trim(), n.definition.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Serializes a quiz as "Question:/Answer:/Explanation:" blocks separated by
/// blank lines. Only the correct answer is carried over.
pub fn quiz_to_source_text(quiz: &QuizResult) -> String {
    quiz.questions
        .iter()
        .map(|q| {
            format!(
                "Question: {}\nAnswer: {}\nExplanation: {}",
                q.question_text.trim(),
                q.correct_answer.trim(),
                q.explanation.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyTab {
    #[default]
    Notes,
    Quiz,
}

impl StudyTab {
    pub fn as_str(self) -> &'static str {
        match self {
            StudyTab::Notes => "notes",
            StudyTab::Quiz => "quiz",
        }
    }

    /// Anything other than `quiz` opens the notes tab.
    pub fn parse(value: &str) -> Self {
        if value == "quiz" {
            StudyTab::Quiz
        } else {
            StudyTab::Notes
        }
    }
}

/// A link to a subject's study page with prefilled generator input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyLink {
    pub subject_slug: String,
    pub topic: String,
    pub source_text: Option<String>,
    pub tab: StudyTab,
}

impl StudyLink {
    pub fn quiz_from_notes(subject_slug: &str, topic: &str, notes: &NotesResult) -> PortResult<Self> {
        if notes.notes.is_empty() {
            return Err(PortError::Validation(
                "There are no notes to build a quiz from.".to_string(),
            ));
        }
        Ok(Self {
            subject_slug: subject_slug.to_string(),
            topic: topic.to_string(),
            source_text: Some(notes_to_source_text(notes)),
            tab: StudyTab::Quiz,
        })
    }

    pub fn notes_from_quiz(subject_slug: &str, topic: &str, quiz: &QuizResult) -> PortResult<Self> {
        if quiz.questions.is_empty() {
            return Err(PortError::Validation(
                "There are no questions to build notes from.".to_string(),
            ));
        }
        Ok(Self {
            subject_slug: subject_slug.to_string(),
            topic: topic.to_string(),
            source_text: Some(quiz_to_source_text(quiz)),
            tab: StudyTab::Notes,
        })
    }

    pub fn query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("topic", &self.topic);
        if let Some(text) = &self.source_text {
            query.append_pair("sourceText", text);
        }
        query.append_pair("tab", self.tab.as_str());
        query.finish()
    }

    pub fn path(&self) -> String {
        format!("/dashboard/subjects/{}/study?{}", self.subject_slug, self.query())
    }

    /// Reads a study page query string. Missing keys fall back to an empty
    /// topic, no source text and the notes tab.
    pub fn from_query(subject_slug: &str, query: &str) -> Self {
        let mut link = Self {
            subject_slug: subject_slug.to_string(),
            topic: String::new(),
            source_text: None,
            tab: StudyTab::Notes,
        };
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "topic" => link.topic = value.into_owned(),
                "sourceText" if !value.is_empty() => link.source_text = Some(value.into_owned()),
                "tab" => link.tab = StudyTab::parse(&value),
                _ => {}
            }
        }
        link
    }
}
