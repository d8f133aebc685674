//! Answer generator: one chat-completion call with fixed knobs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerateError;

pub const MODEL: &str = "gpt-4o";
pub const TEMPERATURE: f32 = 0.5;
pub const MAX_TOKENS: u32 = 200;

/// Prompt sent to the model for a user question.
pub fn explanation_prompt(question: &str) -> String {
    format!("Generate a detailed medical explanation for: {question}")
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str) -> Result<String, GenerateError>;
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn build_request(question: &str) -> ChatRequest<'static> {
    ChatRequest {
        model: MODEL,
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: explanation_prompt(question),
        }],
        max_tokens: Some(MAX_TOKENS),
        temperature: Some(TEMPERATURE),
    }
}

fn first_choice_text(resp: ChatCompletionResponse) -> Result<String, GenerateError> {
    resp.choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or(GenerateError::Empty)
}

#[async_trait]
impl AnswerGenerator for OpenAiGenerator {
    async fn generate(&self, question: &str) -> Result<String, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or(GenerateError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&build_request(question))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response.json::<ChatCompletionResponse>().await?;
        let text = first_choice_text(parsed)?;
        debug!(chars = text.chars().count(), "explanation generated");
        Ok(text)
    }
}
