//! One question in, one combined reply out.

use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::config::Config;
use crate::error::GenerateError;
use crate::generator::{AnswerGenerator, OpenAiGenerator};
use crate::pubmed::{lookup, EntrezClient, LiteratureSource};
use crate::reply::format_reply;
use crate::transcript::{Role, Session};

pub const GENERATING_STATUS: &str = "🤖 Generating medical response...";
pub const SEARCHING_STATUS: &str = "🔍 Searching PubMed for relevant articles...";

/// Progress notifications emitted while a round-trip runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Generating,
    Searching,
}

impl Stage {
    pub fn status(&self) -> &'static str {
        match self {
            Stage::Generating => GENERATING_STATUS,
            Stage::Searching => SEARCHING_STATUS,
        }
    }
}

/// Sequences the generator, the lookup and reply assembly.
#[derive(Clone)]
pub struct ChatBot {
    generator: Arc<dyn AnswerGenerator>,
    source: Arc<dyn LiteratureSource>,
    max_results: usize,
}

impl ChatBot {
    pub fn new(
        generator: Arc<dyn AnswerGenerator>,
        source: Arc<dyn LiteratureSource>,
        max_results: usize,
    ) -> Self {
        Self {
            generator,
            source,
            max_results,
        }
    }

    /// Wires the OpenAI generator and the E-utilities client from config.
    ///
    /// NCBI requires a contact address on every E-utilities call, so a
    /// missing `ENTREZ_EMAIL` is a startup error.
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let Some(email) = cfg.entrez_email.clone() else {
            anyhow::bail!("ENTREZ_EMAIL must be set to a contact address for NCBI E-utilities");
        };
        let http = reqwest::Client::new();
        let generator = OpenAiGenerator::new(
            http.clone(),
            cfg.openai_base_url.clone(),
            cfg.openai_api_key.clone(),
        );
        let source = EntrezClient::new(
            http,
            cfg.entrez_base_url.clone(),
            email,
            cfg.ncbi_api_key.clone(),
        );
        Ok(Self::new(Arc::new(generator), Arc::new(source), cfg.max_results))
    }

    pub async fn submit(&self, session: &mut Session, question: &str) -> Result<String, GenerateError> {
        self.submit_with_progress(session, question, |_| {}).await
    }

    /// Runs one round-trip, calling `on_stage` before each slow step.
    ///
    /// A generator error leaves `session` untouched. Lookup errors never
    /// surface here; they are rendered into the reply.
    pub async fn submit_with_progress<F>(
        &self,
        session: &mut Session,
        question: &str,
        mut on_stage: F,
    ) -> Result<String, GenerateError>
    where
        F: FnMut(Stage) + Send,
    {
        let span = info_span!("round_trip", session = %session.id);
        async move {
            on_stage(Stage::Generating);
            let answer = self.generator.generate(question).await?;

            on_stage(Stage::Searching);
            let outcome = lookup(self.source.as_ref(), question, self.max_results).await;

            let reply = format_reply(&answer, &outcome);

            session.transcript.append(Role::User, question);
            session.transcript.append(Role::Assistant, reply.clone());
            session.memory.record(question, reply.clone());

            info!(messages = session.transcript.len(), "round-trip complete");
            Ok(reply)
        }
        .instrument(span)
        .await
    }
}
