//! JSON access to the caller's session.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::session::{self, BrowserSession};
use crate::error::ServerError;
use crate::state::AppState;
use crate::transcript::{Exchange, Message, MEMORY_KEY};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/messages", get(messages))
        .route("/memory", get(memory))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub messages: Vec<Message>,
}

#[derive(Serialize)]
pub struct MemoryResponse {
    pub key: &'static str,
    pub exchanges: Vec<Exchange>,
    /// The same buffer as alternating user/assistant messages.
    pub messages: Vec<Message>,
}

/// `POST /api/chat`: one round-trip, returning the reply and the transcript.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ServerError> {
    if req.question.trim().is_empty() {
        return Err(ServerError::BadRequest("question must not be empty".into()));
    }
    let browser = BrowserSession::resolve(&state, &headers);
    let body = {
        let mut session = browser.handle.lock().await;
        let reply = state.bot.submit(&mut session, &req.question).await?;
        ChatResponse {
            reply,
            messages: session.transcript.messages().to_vec(),
        }
    };
    Ok(browser.attach(Json(body)))
}

/// `GET /api/messages`: the transcript in insertion order.
pub async fn messages(State(state): State<AppState>, headers: HeaderMap) -> Json<Vec<Message>> {
    let messages = match session::existing(&state, &headers) {
        Some(handle) => handle.lock().await.transcript.messages().to_vec(),
        None => Vec::new(),
    };
    Json(messages)
}

/// `GET /api/memory`: the recorded exchanges.
pub async fn memory(State(state): State<AppState>, headers: HeaderMap) -> Json<MemoryResponse> {
    let body = match session::existing(&state, &headers) {
        Some(handle) => {
            let session = handle.lock().await;
            MemoryResponse {
                key: session.memory.key(),
                exchanges: session.memory.exchanges().to_vec(),
                messages: session.memory.as_messages(),
            }
        }
        None => MemoryResponse {
            key: MEMORY_KEY,
            exchanges: Vec::new(),
            messages: Vec::new(),
        },
    };
    Json(body)
}
