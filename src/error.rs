//! Error types for the chatbot.
//!
//! Two tiers: [`LookupError`] never leaves the literature lookup (it is folded
//! into a sentinel record), while [`GenerateError`] propagates out of a
//! round-trip untouched. [`ServerError`] is what HTTP handlers return.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures of the language-model call.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider response contained no choices")]
    Empty,
}

/// Failures anywhere inside a PubMed search or fetch.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Transport or decode failure. Built via `From`, which drops the request
    /// URL: it carries the contact email and NCBI key as query parameters.
    #[error("{0}")]
    Http(reqwest::Error),
    #[error("E-utilities returned {status} for {endpoint}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("malformed esearch response: {0}")]
    Malformed(String),
    #[error("invalid PMID {0:?}")]
    InvalidId(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        LookupError::Http(e.without_url())
    }
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The answer generator failed; the round-trip was abandoned.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerateError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("template error: {0}")]
    Render(#[from] minijinja::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::Generation(e) => {
                error!(error = %e, "answer generation failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "the language model could not answer this question".to_owned(),
                )
            }
            ServerError::Render(e) => {
                error!(error = %e, "page rendering failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}
