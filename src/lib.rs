//! Medical chatbot that pairs a language-model explanation with PubMed
//! abstracts, served as a browser chat (and a terminal REPL).

pub mod chat;
pub mod config;
pub mod error;
pub mod generator;
pub mod pubmed;
pub mod render;
pub mod repl;
pub mod reply;
pub mod routes;
pub mod state;
pub mod transcript;

pub use chat::ChatBot;
pub use config::Config;
pub use error::{GenerateError, LookupError, ServerError};
pub use pubmed::{LookupOutcome, Record};
pub use transcript::{Exchange, Message, Role, Session};
