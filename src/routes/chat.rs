//! Browser chat page.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{debug, info};

use super::session::{self, BrowserSession};
use crate::error::ServerError;
use crate::render::chat_page;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show_transcript).post(submit_question))
}

#[derive(Deserialize)]
pub struct QuestionForm {
    #[serde(default)]
    pub question: String,
}

/// Renders every message of the caller's session.
pub async fn show_transcript(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let page = match session::existing(&state, &headers) {
        Some(handle) => chat_page(handle.lock().await.transcript.messages())?,
        None => chat_page(&[])?,
    };
    Ok(Html(page).into_response())
}

/// Runs one round-trip, then sends the browser back to the transcript.
pub async fn submit_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<QuestionForm>,
) -> Result<Response, ServerError> {
    if form.question.trim().is_empty() {
        debug!("ignoring empty submission");
        return Ok(Redirect::to("/").into_response());
    }

    let browser = BrowserSession::resolve(&state, &headers);
    {
        let mut session = browser.handle.lock().await;
        info!(session = %session.id, "question received");
        state.bot.submit(&mut session, &form.question).await?;
    }
    Ok(browser.attach(Redirect::to("/")))
}
