//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a quiz WebSocket connection.
//! One loop multiplexes client messages, the countdown and the login's auth gate.

use crate::{
    error::flow_failure,
    web::{
        middleware::AuthSessionId,
        protocol::{ClientMessage, ServerMessage},
        quiz_timer::{TimerEvent, TimerSlot},
        state::AppState,
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use edusync_core::{
    auth_gate::{AuthGate, AuthState, AuthSubscription, LOGIN_ROUTE},
    domain::QuizRequest,
    flows,
    ports::PortError,
    quiz::{QuizAttempt, QuizDuration, SubmitKind},
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::{fmt::Display, sync::Arc};
use tracing::{error, info, warn};
use uuid::Uuid;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn quiz_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Extension(auth_session): Extension<AuthSessionId>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user_id, auth_session))
}

async fn handle_socket(
    socket: WebSocket,
    app_state: Arc<AppState>,
    user_id: Uuid,
    auth_session: AuthSessionId,
) {
    info!("New quiz connection established for user: {}", user_id);
    let (mut sender, receiver) = socket.split();

    // --- 1. Join the login's auth gate ---
    match join_gate(&app_state, user_id, &auth_session.0).await {
        Some((_gate, auth)) => {
            // --- 2. Main Message Loop ---
            run_session(receiver, &mut sender, &app_state, auth, user_id).await;
        }
        None => {
            send(&mut sender, &redirect_to_login()).await;
        }
    }

    // --- 3. Cleanup ---
    let _ = sender.close().await;
    info!("Quiz connection closed.");
}

/// Marks the login's gate as signed in and subscribes to it. The session is
/// checked again after subscribing, so a logout that landed before the gate
/// existed still ends the connection. The gate must be held for as long as
/// the subscription is used.
async fn join_gate(
    app_state: &AppState,
    user_id: Uuid,
    auth_session_id: &str,
) -> Option<(Arc<AuthGate>, AuthSubscription)> {
    let gate = app_state.sessions.gate_for(auth_session_id);
    match app_state.identity.get_user(user_id).await {
        Ok(user) => gate.resolve(AuthState::Authenticated(user)),
        Err(e) => {
            error!("Failed to load user {}: {:?}", user_id, e);
            return None;
        }
    }
    let auth = gate.subscribe();
    if let Err(e) = app_state.identity.validate_auth_session(auth_session_id).await {
        warn!("Login for user {} ended before the quiz connection joined: {:?}", user_id, e);
        gate.sign_out();
        return None;
    }
    Some((gate, auth))
}

/// Multiplexes client frames, the countdown and the auth subscription until
/// the client leaves or the login ends.
async fn run_session<R, S, E>(
    mut receiver: R,
    sender: &mut S,
    app_state: &AppState,
    mut auth: AuthSubscription,
    user_id: Uuid,
) where
    R: Stream<Item = Result<Message, E>> + Unpin,
    S: Sink<Message> + Unpin,
    E: Display,
{
    let mut session = QuizSession::new(app_state.config.quiz_default_duration);
    loop {
        let keep_going = tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    session.handle_text(text.as_str(), app_state, sender).await
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client disconnected.");
                    false
                }
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    false
                }
                Some(Ok(_)) => true,
            },
            event = session.timer.next() => match event {
                TimerEvent::Tick { remaining_secs } => {
                    send(sender, &ServerMessage::Tick { remaining_secs }).await
                }
                TimerEvent::Expired => {
                    info!("Quiz timer expired; auto-submitting.");
                    session.submit(SubmitKind::Timer, app_state, sender).await
                }
            },
            state = auth.changed() => match state {
                Some(AuthState::Authenticated(_)) | Some(AuthState::Loading) => true,
                Some(AuthState::Unauthenticated) | None => {
                    info!("Login ended; closing quiz connection for user {}.", user_id);
                    send(sender, &redirect_to_login()).await;
                    false
                }
            },
        };
        if !keep_going {
            break;
        }
    }
    session.timer.disarm();
    auth.unsubscribe();
}

fn redirect_to_login() -> ServerMessage {
    ServerMessage::Redirect {
        to: LOGIN_ROUTE.to_string(),
    }
}

/// Serializes and sends one message. Returns `false` once the socket is gone.
async fn send<S: Sink<Message> + Unpin>(sender: &mut S, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

async fn send_error<S: Sink<Message> + Unpin>(sender: &mut S, message: impl Into<String>) -> bool {
    send(
        sender,
        &ServerMessage::Error {
            message: message.into(),
        },
    )
    .await
}

/// Validation messages are already written for the learner.
fn user_message(err: &PortError) -> String {
    match err {
        PortError::Validation(message) => message.clone(),
        other => other.to_string(),
    }
}

//=========================================================================================
// QuizSession (Specific to One WebSocket Connection)
//=========================================================================================

struct QuizSession {
    attempt: Option<QuizAttempt>,
    last_request: Option<(QuizRequest, QuizDuration)>,
    default_duration: QuizDuration,
    timer: TimerSlot,
}

impl QuizSession {
    fn new(default_duration: QuizDuration) -> Self {
        Self {
            attempt: None,
            last_request: None,
            default_duration,
            timer: TimerSlot::default(),
        }
    }

    async fn handle_text<S: Sink<Message> + Unpin>(
        &mut self,
        text: &str,
        app_state: &AppState,
        sender: &mut S,
    ) -> bool {
        let client_msg = match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Failed to deserialize client message: {}", e);
                return send_error(sender, "Unrecognised message.").await;
            }
        };
        match client_msg {
            ClientMessage::StartQuiz {
                request,
                duration_secs,
            } => {
                let duration = match duration_secs {
                    Some(secs) => match QuizDuration::from_secs(secs) {
                        Ok(duration) => duration,
                        Err(e) => return send_error(sender, user_message(&e)).await,
                    },
                    None => self.default_duration,
                };
                self.start(request, duration, app_state, sender).await
            }
            ClientMessage::Regenerate => match self.last_request.clone() {
                Some((request, duration)) => self.start(request, duration, app_state, sender).await,
                None => send_error(sender, "There is no quiz to regenerate.").await,
            },
            ClientMessage::SelectAnswer { index, option } => match self.attempt.as_mut() {
                Some(attempt) => match attempt.select_answer(index, &option) {
                    Ok(()) => true,
                    Err(e) => send_error(sender, user_message(&e)).await,
                },
                None => send_error(sender, "Generate a quiz first.").await,
            },
            ClientMessage::SubmitQuiz => self.submit(SubmitKind::Manual, app_state, sender).await,
        }
    }

    /// Generates a quiz and arms its timer. Any previous quiz and timer are
    /// discarded first.
    async fn start<S: Sink<Message> + Unpin>(
        &mut self,
        request: QuizRequest,
        duration: QuizDuration,
        app_state: &AppState,
        sender: &mut S,
    ) -> bool {
        self.timer.disarm();
        self.attempt = None;

        let quiz = match flows::generate_quiz(app_state.quiz_adapter.as_ref(), &request).await {
            Ok(quiz) => quiz,
            Err(e) => {
                error!("Quiz generation failed: {:?}", e);
                return send_error(sender, flow_failure("a quiz", &e).1).await;
            }
        };
        info!(
            questions = quiz.questions.len(),
            duration_secs = duration.secs(),
            "Quiz ready."
        );

        self.attempt = Some(QuizAttempt::new(
            request.subject.clone(),
            request.topic.clone(),
            quiz.clone(),
        ));
        self.last_request = Some((request, duration));
        let alive = send(
            sender,
            &ServerMessage::QuizReady {
                quiz,
                duration_secs: duration.secs(),
            },
        )
        .await;
        if alive {
            self.timer.arm(duration);
        }
        alive
    }

    /// The single submit path shared by the button and the timer. The attempt
    /// refuses a second submit, so feedback is produced at most once.
    async fn submit<S: Sink<Message> + Unpin>(
        &mut self,
        kind: SubmitKind,
        app_state: &AppState,
        sender: &mut S,
    ) -> bool {
        let Some(attempt) = self.attempt.as_mut() else {
            return send_error(sender, "Generate a quiz first.").await;
        };
        let outcome = match attempt.submit(kind) {
            Ok(outcome) => outcome,
            Err(e) => return send_error(sender, user_message(&e)).await,
        };
        self.timer.disarm();
        let feedback_request = attempt.feedback_request(&outcome);
        info!(
            percentage = outcome.score.percentage,
            auto_submitted = outcome.auto_submitted,
            "Quiz submitted."
        );

        if !send(sender, &ServerMessage::from(outcome)).await {
            return false;
        }

        match flows::generate_feedback(app_state.feedback_adapter.as_ref(), &feedback_request).await {
            Ok(result) => send(sender, &ServerMessage::Feedback { text: result.feedback }).await,
            Err(e) => {
                error!("Feedback generation failed: {:?}", e);
                send_error(sender, flow_failure("feedback", &e).1).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapters::InMemoryIdentityStore, config::Config, web::state::SessionHub};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use edusync_core::domain::{
        EnhanceRequest, EnhanceResult, FeedbackRequest, FeedbackResult, LearningPathRequest,
        LearningPathResult, NotesRequest, NotesResult, QuizQuestion, QuizResult, User,
        ALL_CORRECT_FEEDBACK,
    };
    use edusync_core::ports::{
        LearningPathService, NotesGenerationService, PortResult, QuizFeedbackService,
        QuizGenerationService, TextEnhancementService,
    };
    use futures::channel::mpsc;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::{task::JoinHandle, time::timeout};

    #[derive(Default)]
    struct ScriptedFlows {
        quiz_calls: AtomicUsize,
        feedback_calls: AtomicUsize,
    }

    #[async_trait]
    impl QuizGenerationService for ScriptedFlows {
        async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<QuizResult> {
            let round = self.quiz_calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(QuizResult {
                questions: (0..usize::from(request.question_count))
                    .map(|i| QuizQuestion {
                        question_text: format!("Round {}: what is {} + 1?", round, i),
                        options: (i..i + 4).map(|n| (n + 1).to_string()).collect(),
                        correct_answer: (i + 1).to_string(),
                        explanation: format!("{} plus one is {}.", i, i + 1),
                    })
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl QuizFeedbackService for ScriptedFlows {
        async fn generate_feedback(&self, _request: &FeedbackRequest) -> PortResult<FeedbackResult> {
            self.feedback_calls.fetch_add(1, Ordering::SeqCst);
            Ok(FeedbackResult {
                feedback: "Practise adding one.".to_string(),
            })
        }
    }

    #[async_trait]
    impl NotesGenerationService for ScriptedFlows {
        async fn generate_notes(&self, _request: &NotesRequest) -> PortResult<NotesResult> {
            Err(PortError::Unexpected("notes are not used here".to_string()))
        }
    }

    #[async_trait]
    impl TextEnhancementService for ScriptedFlows {
        async fn enhance_text(&self, _request: &EnhanceRequest) -> PortResult<EnhanceResult> {
            Err(PortError::Unexpected("enhance is not used here".to_string()))
        }
    }

    #[async_trait]
    impl LearningPathService for ScriptedFlows {
        async fn suggest_learning_path(
            &self,
            _request: &LearningPathRequest,
        ) -> PortResult<LearningPathResult> {
            Err(PortError::Unexpected("learning paths are not used here".to_string()))
        }
    }

    fn app_state(flows: Arc<ScriptedFlows>) -> Arc<AppState> {
        Arc::new(AppState {
            identity: Arc::new(InMemoryIdentityStore::new()),
            config: Arc::new(Config::default()),
            notes_adapter: flows.clone(),
            quiz_adapter: flows.clone(),
            feedback_adapter: flows.clone(),
            enhance_adapter: flows.clone(),
            learning_path_adapter: flows,
            sessions: Arc::new(SessionHub::new()),
        })
    }

    /// One quiz connection driven through channels instead of a socket.
    struct Connection {
        client: mpsc::UnboundedSender<Result<Message, axum::Error>>,
        server: mpsc::UnboundedReceiver<Message>,
        gate: Arc<AuthGate>,
        flows: Arc<ScriptedFlows>,
        task: JoinHandle<()>,
    }

    fn connect() -> Connection {
        let flows = Arc::new(ScriptedFlows::default());
        let state = app_state(flows.clone());
        let gate = Arc::new(AuthGate::new());
        gate.resolve(AuthState::Authenticated(User {
            user_id: Uuid::new_v4(),
            email: "sipho@example.com".to_string(),
            display_name: Some("Sipho Mokoena".to_string()),
        }));
        let auth = gate.subscribe();
        let (client, client_rx) = mpsc::unbounded();
        let (mut server_tx, server) = mpsc::unbounded();
        let task = tokio::spawn(async move {
            run_session(client_rx, &mut server_tx, &state, auth, Uuid::new_v4()).await;
        });
        Connection {
            client,
            server,
            gate,
            flows,
            task,
        }
    }

    impl Connection {
        fn send(&self, msg: Value) {
            self.client
                .unbounded_send(Ok(Message::Text(msg.to_string().into())))
                .unwrap();
        }

        fn start_quiz(&self, duration_secs: u32) {
            self.send(json!({
                "type": "start_quiz",
                "request": {"subject": "Mathematics", "topic": "Addition", "questionCount": 2},
                "duration_secs": duration_secs,
            }));
        }

        async fn recv(&mut self) -> Value {
            let msg = timeout(Duration::from_secs(60), self.server.next())
                .await
                .expect("no message within a minute")
                .expect("connection closed");
            match msg {
                Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
                other => panic!("unexpected frame {:?}", other),
            }
        }

        async fn expect_ticks(&mut self, from: u32, down_to: u32) {
            for remaining in (down_to..=from).rev() {
                assert_eq!(
                    self.recv().await,
                    json!({"type": "tick", "remaining_secs": remaining})
                );
            }
        }

        /// Lets several minutes of virtual time pass without any message.
        async fn expect_silence(&mut self) {
            let next = timeout(Duration::from_secs(300), self.server.next()).await;
            assert!(next.is_err(), "unexpected message {:?}", next);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_auto_submits_exactly_once() {
        let mut conn = connect();
        conn.start_quiz(10);

        let ready = conn.recv().await;
        assert_eq!(ready["type"], "quiz_ready");
        assert_eq!(ready["duration_secs"], 10);
        conn.expect_ticks(9, 1).await;

        let submitted = conn.recv().await;
        assert_eq!(submitted["type"], "quiz_submitted");
        assert_eq!(submitted["auto_submitted"], true);
        assert_eq!(submitted["score"]["percentage"], 0);
        assert_eq!(
            conn.recv().await,
            json!({"type": "feedback", "text": "Practise adding one."})
        );

        conn.expect_silence().await;
        assert_eq!(conn.flows.feedback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_stops_the_countdown() {
        let mut conn = connect();
        conn.start_quiz(10);
        let ready = conn.recv().await;
        conn.expect_ticks(9, 5).await;

        for (index, question) in ready["quiz"]["questions"].as_array().unwrap().iter().enumerate() {
            conn.send(json!({
                "type": "select_answer",
                "index": index,
                "option": question["correctAnswer"],
            }));
        }
        conn.send(json!({"type": "submit_quiz"}));

        let submitted = conn.recv().await;
        assert_eq!(submitted["type"], "quiz_submitted");
        assert_eq!(submitted["auto_submitted"], false);
        assert_eq!(submitted["score"]["percentage"], 100);
        assert_eq!(
            conn.recv().await,
            json!({"type": "feedback", "text": ALL_CORRECT_FEEDBACK})
        );

        conn.expect_silence().await;
        assert_eq!(conn.flows.feedback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn regenerate_restarts_the_countdown() {
        let mut conn = connect();
        conn.start_quiz(10);
        let first = conn.recv().await;
        assert!(first["quiz"]["questions"][0]["questionText"]
            .as_str()
            .unwrap()
            .starts_with("Round 1"));
        conn.expect_ticks(9, 5).await;

        conn.send(json!({"type": "regenerate"}));
        let second = conn.recv().await;
        assert_eq!(second["type"], "quiz_ready");
        assert_eq!(second["duration_secs"], 10);
        assert!(second["quiz"]["questions"][0]["questionText"]
            .as_str()
            .unwrap()
            .starts_with("Round 2"));

        // The first timer would have expired in the middle of these.
        conn.expect_ticks(9, 1).await;
        let submitted = conn.recv().await;
        assert_eq!(submitted["type"], "quiz_submitted");
        assert_eq!(submitted["auto_submitted"], true);
        assert_eq!(conn.recv().await["type"], "feedback");

        conn.expect_silence().await;
        assert_eq!(conn.flows.quiz_calls.load(Ordering::SeqCst), 2);
        assert_eq!(conn.flows.feedback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_ends_the_session_and_its_timer() {
        let conn = connect();
        conn.start_quiz(10);
        let Connection {
            client,
            mut server,
            task,
            flows,
            ..
        } = conn;
        assert_eq!(server.next().await.map(|m| matches!(m, Message::Text(_))), Some(true));

        drop(client);
        timeout(Duration::from_secs(1), task)
            .await
            .expect("session did not end")
            .unwrap();
        assert!(server.next().await.is_none());
        assert_eq!(flows.feedback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_redirects_to_the_login_page() {
        let mut conn = connect();
        conn.start_quiz(10);
        assert_eq!(conn.recv().await["type"], "quiz_ready");

        conn.gate.sign_out();
        assert_eq!(conn.recv().await, json!({"type": "redirect", "to": LOGIN_ROUTE}));
        assert!(conn.server.next().await.is_none());
    }

    #[tokio::test]
    async fn joining_after_logout_is_refused() {
        let state = app_state(Arc::new(ScriptedFlows::default()));
        let user = state
            .identity
            .create_user("lerato@example.com", "hash", "Lerato Molefe")
            .await
            .unwrap();
        let expires_at = Utc::now() + ChronoDuration::days(1);
        for cookie in ["kept", "ended"] {
            state
                .identity
                .create_auth_session(cookie, user.user_id, expires_at)
                .await
                .unwrap();
        }

        // The logout finishes after the upgrade was authorised but before
        // the socket reaches its gate.
        state.identity.delete_auth_session("ended").await.unwrap();
        state.sessions.sign_out("ended");

        assert!(join_gate(&state, user.user_id, "ended").await.is_none());
        let (gate, _auth) = join_gate(&state, user.user_id, "kept").await.unwrap();
        assert!(matches!(gate.current(), AuthState::Authenticated(_)));
    }
}
