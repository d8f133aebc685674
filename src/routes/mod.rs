//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - `/` chat page (GET renders, POST submits a question)
//! - `/api` JSON access to the same session
//! - `/health` heartbeat

mod api;
mod chat;
mod health;
mod session;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use session::SESSION_COOKIE;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: AppState) -> Router {
    Router::new()
        .merge(chat::router())
        .merge(health::router())
        .nest("/api", api::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
