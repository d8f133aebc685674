//! Cookie-based browser session lookup.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::state::{AppState, SessionHandle};

pub const SESSION_COOKIE: &str = "pubmed_chat_session";

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// The caller's existing session, if the cookie names a live one.
///
/// Read-only routes use this and never start a session, so cookie-less
/// traffic leaves no state behind.
pub fn existing(state: &AppState, headers: &HeaderMap) -> Option<SessionHandle> {
    session_id(headers).and_then(|id| state.sessions.get(id))
}

/// Session a submission writes to. `fresh` is set when the cookie was missing
/// or pointed at a session this process does not know.
pub struct BrowserSession {
    pub handle: SessionHandle,
    fresh: Option<Uuid>,
}

impl BrowserSession {
    pub fn resolve(state: &AppState, headers: &HeaderMap) -> Self {
        let (id, handle, created) = state.sessions.get_or_create(session_id(headers));
        Self {
            handle,
            fresh: created.then_some(id),
        }
    }

    /// Adds the `Set-Cookie` header when a new session was started.
    pub fn attach(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Some(id) = self.fresh {
            let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}
