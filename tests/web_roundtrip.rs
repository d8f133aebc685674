use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use pubmed_chat::generator::AnswerGenerator;
use pubmed_chat::pubmed::LiteratureSource;
use pubmed_chat::routes::{self, SESSION_COOKIE};
use pubmed_chat::state::AppState;
use pubmed_chat::{ChatBot, GenerateError, LookupError};

/// Generator that answers every question the same way, or always fails.
struct ScriptedGenerator(Option<&'static str>);

#[async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn generate(&self, _question: &str) -> Result<String, GenerateError> {
        self.0.map(str::to_string).ok_or(GenerateError::MissingApiKey)
    }
}

/// The "aspirin and headache" fixture: two PMIDs, abstracts of 50 and 400 chars.
struct AspirinLibrary;

#[async_trait]
impl LiteratureSource for AspirinLibrary {
    async fn search(&self, _query: &str, _max: usize) -> Result<Vec<String>, LookupError> {
        Ok(vec!["111".into(), "222".into()])
    }

    async fn fetch_abstract(&self, pmid: &str) -> Result<String, LookupError> {
        Ok(match pmid {
            "111" => "a".repeat(50),
            _ => "b".repeat(400),
        })
    }
}

struct Unreachable;

#[async_trait]
impl LiteratureSource for Unreachable {
    async fn search(&self, _query: &str, _max: usize) -> Result<Vec<String>, LookupError> {
        Err(LookupError::Malformed("connection refused".into()))
    }

    async fn fetch_abstract(&self, _pmid: &str) -> Result<String, LookupError> {
        Err(LookupError::Malformed("connection refused".into()))
    }
}

fn state(generator: ScriptedGenerator, source: impl LiteratureSource + 'static) -> AppState {
    AppState::new(ChatBot::new(Arc::new(generator), Arc::new(source), 3))
}

fn app(generator: ScriptedGenerator, source: impl LiteratureSource + 'static) -> Router {
    routes::build(state(generator, source))
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn cookie_from(resp: &axum::response::Response) -> String {
    let set = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    assert!(set.starts_with(SESSION_COOKIE));
    set.split(';').next().unwrap().to_string()
}

fn get(path: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_form(question: &str, cookie: &str) -> Request<Body> {
    let encoded: String = question
        .bytes()
        .map(|b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => (b as char).to_string(),
            b' ' => "+".to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect();
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("question={encoded}")))
        .unwrap()
}

fn post_json(question: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "question": question }).to_string()))
        .unwrap()
}

/// Asks a first question without a cookie; the reply starts the session.
async fn new_session(app: &Router, question: &str) -> String {
    let resp = app.clone().oneshot(post_form(question, "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    cookie_from(&resp)
}

#[tokio::test]
async fn form_submission_appends_question_and_reply() {
    let app = app(ScriptedGenerator(Some("Aspirin eases tension headaches.")), AspirinLibrary);
    let resp = app
        .clone()
        .oneshot(post_form("aspirin and headache", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[header::LOCATION], "/");
    let cookie = cookie_from(&resp);

    let resp = app.clone().oneshot(get("/api/messages", &cookie)).await.unwrap();
    let messages: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "aspirin and headache");
    assert_eq!(messages[1]["role"], "assistant");

    let reply = messages[1]["content"].as_str().unwrap();
    assert_eq!(reply.matches("**Article ").count(), 2);
    assert!(reply.contains(&format!("📜 Abstract: {}...", "a".repeat(50))));
    assert!(reply.contains(&format!("📜 Abstract: {}...", "b".repeat(300))));
    assert!(!reply.contains(&"b".repeat(301)));
    assert!(reply.contains("https://pubmed.ncbi.nlm.nih.gov/111"));
    assert!(reply.contains("https://pubmed.ncbi.nlm.nih.gov/222"));
}

#[tokio::test]
async fn rerender_without_input_is_identical() {
    let app = app(ScriptedGenerator(Some("answer")), AspirinLibrary);
    let cookie = new_session(&app, "fever").await;

    let first = body_string(app.clone().oneshot(get("/", &cookie)).await.unwrap()).await;
    let second = body_string(app.clone().oneshot(get("/", &cookie)).await.unwrap()).await;

    assert_eq!(first, second);
    assert!(first.contains("<strong>Article 1</strong>"));
    assert!(first.find("fever").unwrap() < first.find("<strong>Article 1</strong>").unwrap());
}

#[tokio::test]
async fn sessions_do_not_share_transcripts() {
    let app = app(ScriptedGenerator(Some("answer")), AspirinLibrary);
    let alice = new_session(&app, "only alice asked").await;
    let bob = new_session(&app, "bob asked").await;
    assert_ne!(alice, bob);

    app.clone().oneshot(post_form("alice again", &alice)).await.unwrap();

    let resp = app.clone().oneshot(get("/api/messages", &bob)).await.unwrap();
    let messages: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "bob asked");
}

#[tokio::test]
async fn lookup_failure_still_answers() {
    let app = app(ScriptedGenerator(Some("answer")), Unreachable);

    let resp = app.clone().oneshot(post_json("aspirin", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    cookie_from(&resp);

    let body: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    let reply = body["reply"].as_str().unwrap();
    assert_eq!(reply.matches("**Article ").count(), 1);
    assert!(reply.contains("🆔 PMID: N/A"));
    assert!(reply.contains("📜 Abstract: Error fetching PubMed articles: "));
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn generator_failure_is_a_gateway_error_and_adds_nothing() {
    let state = state(ScriptedGenerator(None), AspirinLibrary);
    let (id, _, _) = state.sessions.get_or_create(None);
    let cookie = format!("{SESSION_COOKIE}={id}");
    let app = routes::build(state);

    let resp = app.clone().oneshot(post_form("q", &cookie)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let resp = app.clone().oneshot(get("/api/messages", &cookie)).await.unwrap();
    assert_eq!(body_string(resp).await, "[]");
}

#[tokio::test]
async fn empty_questions_are_ignored() {
    let app = app(ScriptedGenerator(Some("answer")), AspirinLibrary);
    let cookie = new_session(&app, "first").await;

    let resp = app.clone().oneshot(post_form("", &cookie)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = app.clone().oneshot(post_json("   ", &cookie)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.clone().oneshot(get("/api/memory", &cookie)).await.unwrap();
    let memory: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(memory["key"], "pubmed_memory");
    assert_eq!(memory["exchanges"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn memory_records_each_exchange() {
    let app = app(ScriptedGenerator(Some("answer")), AspirinLibrary);
    let resp = app.clone().oneshot(post_json("first", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = cookie_from(&resp);

    let resp = app.clone().oneshot(post_json("second", &cookie)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());

    let resp = app.clone().oneshot(get("/api/memory", &cookie)).await.unwrap();
    let memory: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    let exchanges = memory["exchanges"].as_array().unwrap();
    assert_eq!(exchanges.len(), 2);
    assert_eq!(exchanges[0]["input"], "first");
    assert_eq!(exchanges[1]["input"], "second");
    assert_eq!(memory["messages"].as_array().unwrap().len(), 4);
    assert!(exchanges[1]["output"]
        .as_str()
        .unwrap()
        .starts_with("🤖 **Medical Answer:**"));
}

#[tokio::test]
async fn health_is_reachable() {
    let app = app(ScriptedGenerator(None), Unreachable);
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn cookieless_reads_leave_no_sessions_behind() {
    let state = state(ScriptedGenerator(Some("answer")), AspirinLibrary);
    let app = routes::build(state.clone());

    for path in ["/", "/api/messages", "/api/memory", "/", "/api/messages"] {
        let resp = app.clone().oneshot(get(path, "")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
    }
    let resp = app.clone().oneshot(post_form("   ", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(state.sessions.is_empty());

    new_session(&app, "aspirin").await;
    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn first_visit_renders_an_empty_page() {
    let app = app(ScriptedGenerator(Some("answer")), AspirinLibrary);
    let resp = app.clone().oneshot(get("/", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let page = body_string(resp).await;
    assert!(page.contains("Medical Chatbot with PubMed Integration"));
    assert!(!page.contains("<strong>Article 1</strong>"));
}
