//! crates/edusync_core/src/subjects.rs
//!
//! The South African curriculum subjects offered on the dashboard.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub name: &'static str,
    pub slug: &'static str,
}

pub const SUBJECTS: &[Subject] = &[
    Subject { name: "Mathematics", slug: "mathematics" },
    Subject { name: "Mathematical Literacy", slug: "mathematical-literacy" },
    Subject { name: "Physical Sciences", slug: "physical-sciences" },
    Subject { name: "Life Sciences", slug: "life-sciences" },
    Subject { name: "Accounting", slug: "accounting" },
    Subject { name: "Business Studies", slug: "business-studies" },
    Subject { name: "Economics", slug: "economics" },
    Subject { name: "Information Technology", slug: "it" },
    Subject { name: "Computer Applications Tech", slug: "cat" },
    Subject { name: "History", slug: "history" },
    Subject { name: "Geography", slug: "geography" },
    Subject { name: "Religious Education", slug: "religious-education" },
    Subject { name: "Visual Arts", slug: "visual-arts" },
    Subject { name: "English", slug: "english" },
    Subject { name: "Afrikaans", slug: "afrikaans" },
    Subject { name: "Zulu", slug: "zulu" },
];

pub fn find(slug: &str) -> Option<&'static Subject> {
    SUBJECTS.iter().find(|s| s.slug == slug)
}

/// Turns a URL slug into a title: "life-sciences" becomes "Life Sciences".
pub fn display_name(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Example topics shown in the topic field.
pub fn topic_placeholder(subject_name: &str) -> &'static str {
    match subject_name {
        "Mathematics" => "e.g., 'Quadratic Equations' or 'Trigonometry'",
        "Physical Sciences" => "e.g., 'Newton's Laws of Motion' or 'Chemical Bonding'",
        "Life Sciences" => "e.g., 'DNA Replication' or 'The Human Nervous System'",
        "History" => "e.g., 'The Sharpeville Massacre' or 'Apartheid Legislation'",
        "Geography" => "e.g., 'Climate Regions of South Africa' or 'Plate Tectonics'",
        _ => "e.g., 'Key Concepts' or 'Chapter Summary'",
    }
}
