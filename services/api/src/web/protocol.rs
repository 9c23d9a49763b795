//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for a live quiz session.

use edusync_core::domain::{IncorrectAnswer, QuizRequest, QuizResult};
use edusync_core::quiz::{QuizOutcome, Score, ScoreTier};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Generates a quiz and starts its countdown. Replaces any quiz in progress.
    StartQuiz {
        request: QuizRequest,
        /// 10 to 120 seconds; the configured default when absent.
        #[serde(default)]
        duration_secs: Option<u32>,
    },

    /// Records the learner's choice for one question.
    SelectAnswer { index: usize, option: String },

    /// A manual submit. Refused until every question is answered.
    SubmitQuiz,

    /// Generates a fresh quiz from the last request.
    Regenerate,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A quiz was generated and its timer has started.
    QuizReady { quiz: QuizResult, duration_secs: u32 },

    /// Seconds left on the countdown, once per second.
    Tick { remaining_secs: u32 },

    /// The attempt was scored, either by the learner or by the timer.
    QuizSubmitted {
        score: Score,
        tier: ScoreTier,
        auto_submitted: bool,
        incorrect: Vec<IncorrectAnswer>,
    },

    Feedback { text: String },

    /// The login ended; the client should navigate away.
    Redirect { to: String },

    /// Reports an error to the client, which should display it.
    Error { message: String },
}

impl From<QuizOutcome> for ServerMessage {
    fn from(outcome: QuizOutcome) -> Self {
        ServerMessage::QuizSubmitted {
            score: outcome.score,
            tier: outcome.tier,
            auto_submitted: outcome.auto_submitted,
            incorrect: outcome.incorrect,
        }
    }
}
