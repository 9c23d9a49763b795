//! Router-level tests: the full axum app with the in-memory identity store
//! and scripted flow ports in place of the model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use api_lib::adapters::InMemoryIdentityStore;
use api_lib::config::Config;
use api_lib::web::{
    self,
    state::{AppState, SessionHub},
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use edusync_core::auth_gate::AuthState;
use edusync_core::domain::{
    EnhanceRequest, EnhanceResult, FeedbackRequest, FeedbackResult, LearningPathRequest,
    LearningPathResult, Note, NotesRequest, NotesResult, QuizQuestion, QuizRequest, QuizResult,
    SuggestedMaterial, ALL_CORRECT_FEEDBACK,
};
use edusync_core::ports::{
    LearningPathService, NotesGenerationService, PortResult, QuizFeedbackService,
    QuizGenerationService, TextEnhancementService,
};
use serde_json::{json, Value};
use tower::ServiceExt;

//=========================================================================================
// Scripted Flows
//=========================================================================================

struct ScriptedFlows {
    /// How many notes the "model" returns regardless of the request.
    notes_returned: usize,
    feedback_calls: AtomicUsize,
}

#[async_trait]
impl NotesGenerationService for ScriptedFlows {
    async fn generate_notes(&self, _request: &NotesRequest) -> PortResult<NotesResult> {
        Ok(NotesResult {
            notes: (0..self.notes_returned)
                .map(|i| Note {
                    term: format!("Term {}", i),
                    definition: format!("Definition {}", i),
                })
                .collect(),
        })
    }
}

#[async_trait]
impl QuizGenerationService for ScriptedFlows {
    async fn generate_quiz(&self, request: &QuizRequest) -> PortResult<QuizResult> {
        Ok(sample_quiz(usize::from(request.question_count)))
    }
}

#[async_trait]
impl QuizFeedbackService for ScriptedFlows {
    async fn generate_feedback(&self, _request: &FeedbackRequest) -> PortResult<FeedbackResult> {
        self.feedback_calls.fetch_add(1, Ordering::SeqCst);
        Ok(FeedbackResult {
            feedback: "Revise the order of operations.".to_string(),
        })
    }
}

#[async_trait]
impl TextEnhancementService for ScriptedFlows {
    async fn enhance_text(&self, request: &EnhanceRequest) -> PortResult<EnhanceResult> {
        Ok(EnhanceResult {
            enhanced_text: request.text.trim().to_string(),
        })
    }
}

#[async_trait]
impl LearningPathService for ScriptedFlows {
    async fn suggest_learning_path(
        &self,
        _request: &LearningPathRequest,
    ) -> PortResult<LearningPathResult> {
        Ok(LearningPathResult {
            suggested_materials: vec![SuggestedMaterial {
                title: "Loops".to_string(),
                code: "for i in range(3):\n    print(i)".to_string(),
            }],
        })
    }
}

fn sample_quiz(count: usize) -> QuizResult {
    QuizResult {
        questions: (0..count)
            .map(|i| QuizQuestion {
                question_text: format!("What is {} + 1?", i),
                options: (i..i + 4).map(|n| (n + 1).to_string()).collect(),
                correct_answer: (i + 1).to_string(),
                explanation: format!("{} plus one is {}.", i, i + 1),
            })
            .collect(),
    }
}

//=========================================================================================
// Harness
//=========================================================================================

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    flows: Arc<ScriptedFlows>,
}

fn app_with_notes(notes_returned: usize) -> TestApp {
    let flows = Arc::new(ScriptedFlows {
        notes_returned,
        feedback_calls: AtomicUsize::new(0),
    });
    let state = Arc::new(AppState {
        identity: Arc::new(InMemoryIdentityStore::new()),
        config: Arc::new(Config::default()),
        notes_adapter: flows.clone(),
        quiz_adapter: flows.clone(),
        feedback_adapter: flows.clone(),
        enhance_adapter: flows.clone(),
        learning_path_adapter: flows.clone(),
        sessions: Arc::new(SessionHub::new()),
    });
    TestApp {
        router: web::router(state.clone()),
        state,
        flows,
    }
}

fn app() -> TestApp {
    app_with_notes(5)
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn post_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Signs up a learner and returns the `session=...` cookie pair.
    async fn sign_up(&self, email: &str) -> String {
        let response = self
            .post_json(
                "/auth",
                None,
                json!({
                    "mode": "signup",
                    "name": "Thandi",
                    "surname": "Nkosi",
                    "email": email,
                    "password": "sup3r-secret",
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        session_pair(&response)
    }
}

fn session_pair(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header");
    set_cookie.split(';').next().unwrap().to_string()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

//=========================================================================================
// Auth Gate and Identity
//=========================================================================================

#[tokio::test]
async fn dashboard_redirects_to_login_without_a_session() {
    let app = app();
    for path in ["/dashboard", "/dashboard/subjects/history"] {
        let response = app.get(path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    let response = app.get("/dashboard", Some("session=not-a-real-session")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn api_routes_answer_401_without_a_session() {
    let app = app();
    assert_eq!(app.get("/api/me", None).await.status(), StatusCode::UNAUTHORIZED);
    let response = app
        .post_json("/api/flows/enhance", None, json!({"text": "hello"}))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_then_dashboard_renders_for_the_user() {
    let app = app();
    let cookie = app.sign_up("Thandi@Example.com").await;

    let me = json_body(app.get("/api/me", Some(&cookie)).await).await;
    assert_eq!(me["email"], "thandi@example.com");
    assert_eq!(me["displayName"], "Thandi Nkosi");

    let response = app.get("/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = json_body(response).await;
    assert_eq!(dashboard["greeting"], "Welcome back, Thandi Nkosi!");
    assert_eq!(dashboard["subjects"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn login_checks_the_password() {
    let app = app();
    app.sign_up("thandi@example.com").await;

    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({"email": "thandi@example.com", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(text_body(response).await, "Invalid email or password.");

    let response = app
        .post_json(
            "/auth",
            None,
            json!({"mode": "login", "email": "THANDI@example.com", "password": "sup3r-secret"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Max-Age="));
}

#[tokio::test]
async fn unremembered_login_gets_a_browser_session_cookie() {
    let app = app();
    app.sign_up("thandi@example.com").await;
    let response = app
        .post_json(
            "/auth/login",
            None,
            json!({"email": "thandi@example.com", "password": "sup3r-secret", "remember": false}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(!set_cookie.contains("Max-Age"));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = app();
    app.sign_up("thandi@example.com").await;
    let response = app
        .post_json(
            "/auth/signup",
            None,
            json!({
                "name": "Another",
                "surname": "Learner",
                "email": "thandi@example.com",
                "password": "different-secret",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(text_body(response).await, "This email address is already in use.");
}

#[tokio::test]
async fn profile_update_changes_the_display_name() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let request = Request::builder()
        .method("PUT")
        .uri("/api/me/profile")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(json!({"displayName": "Thandi N."}).to_string()))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["displayName"], "Thandi N.");
}

#[tokio::test]
async fn logout_signs_out_live_connections() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let auth_session_id = cookie.trim_start_matches("session=").to_string();

    // Stand in for a connected quiz socket watching this login.
    let gate = app.state.sessions.gate_for(&auth_session_id);
    let mut subscription = gate.subscribe();

    let response = app.post_json("/auth/logout", Some(&cookie), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(subscription.changed().await, Some(AuthState::Unauthenticated));

    let response = app.get("/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

//=========================================================================================
// Flows and Study Helpers
//=========================================================================================

#[tokio::test]
async fn feedback_with_no_mistakes_skips_the_model() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let response = app
        .post_json(
            "/api/flows/feedback",
            Some(&cookie),
            json!({"subject": "Mathematics", "topic": "Algebra", "incorrectAnswers": []}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["feedback"], ALL_CORRECT_FEEDBACK);
    assert_eq!(app.flows.feedback_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn notes_are_cut_to_the_requested_count() {
    let app = app_with_notes(7);
    let cookie = app.sign_up("thandi@example.com").await;
    let response = app
        .post_json(
            "/api/flows/notes",
            Some(&cookie),
            json!({"subject": "History", "topic": "The Cold War", "notesCount": 5}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["notes"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn too_few_notes_is_a_generation_failure() {
    let app = app_with_notes(2);
    let cookie = app.sign_up("thandi@example.com").await;
    let response = app
        .post_json(
            "/api/flows/notes",
            Some(&cookie),
            json!({"subject": "History", "topic": "The Cold War", "notesCount": 5}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(text_body(response).await, "Could not generate notes. Please try again.");
}

#[tokio::test]
async fn short_topic_is_rejected_before_the_model() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let response = app
        .post_json(
            "/api/flows/quiz",
            Some(&cookie),
            json!({"subject": "History", "topic": "WW"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn quiz_has_four_options_with_the_answer_among_them() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let response = app
        .post_json(
            "/api/flows/quiz",
            Some(&cookie),
            json!({"subject": "Mathematics", "topic": "Addition", "questionCount": 3}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let quiz = json_body(response).await;
    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    for q in questions {
        let options = q["options"].as_array().unwrap();
        assert_eq!(options.len(), 4);
        assert!(options.contains(&q["correctAnswer"]));
    }
}

#[tokio::test]
async fn three_of_five_scores_sixty_percent() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let quiz = serde_json::to_value(sample_quiz(5)).unwrap();
    let response = app
        .post_json(
            "/api/quiz/score",
            Some(&cookie),
            json!({
                "quiz": quiz,
                "answers": {"0": "1", "1": "2", "2": "3", "3": "5", "4": "6"},
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["score"]["percentage"], 60);
    assert_eq!(body["tier"], "middling");
    assert_eq!(body["incorrect"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn notes_link_to_a_prefilled_quiz_tab() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let response = app
        .post_json(
            "/api/study/notes-to-quiz",
            Some(&cookie),
            json!({
                "subjectSlug": "life-sciences",
                "topic": "Photosynthesis",
                "notes": {"notes": [{"term": "Chlorophyll", "definition": "Green pigment."}]},
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["link"]["tab"], "quiz");
    assert_eq!(body["link"]["topic"], "Photosynthesis");
    let path = body["path"].as_str().unwrap();
    assert!(path.starts_with("/dashboard/subjects/life-sciences/study?topic=Photosynthesis"));

    // Following the link prefills the study page.
    let page = json_body(app.get(path, Some(&cookie)).await).await;
    assert_eq!(page["subjectName"], "Life Sciences");
    assert_eq!(page["prefill"]["tab"], "quiz");
    assert_eq!(
        page["prefill"]["sourceText"],
        "Term: Chlorophyll\nDefinition: Green pigment."
    );
}

#[tokio::test]
async fn empty_quiz_cannot_become_notes() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let response = app
        .post_json(
            "/api/study/quiz-to-notes",
            Some(&cookie),
            json!({"subjectSlug": "history", "topic": "The Cold War", "quiz": {"questions": []}}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn uploads_encode_images_and_skip_other_files() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let boundary = "edusync-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"leaf.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"notes.txt\"\r\nContent-Type: text/plain\r\n\r\nhello\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/uploads/images")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header(header::COOKIE, &cookie)
        .body(Body::from(body))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = json_body(response).await;
    assert_eq!(report["imageUrls"][0], "data:image/png;base64,UE5HREFUQQ==");
    assert_eq!(report["skipped"], json!(["notes.txt"]));
}

#[tokio::test]
async fn uploads_past_the_limit_are_refused() {
    let app = app();
    let cookie = app.sign_up("thandi@example.com").await;
    let boundary = "edusync-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nA\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/uploads/images?held=5")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header(header::COOKIE, &cookie)
        .body(Body::from(body))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        text_body(response).await,
        "You can only upload a maximum of 5 images."
    );
}
