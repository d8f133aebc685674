//! Session-scoped chat state: the rendered transcript and the exchange memory.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key the exchange buffer is published under for downstream reuse.
pub const MEMORY_KEY: &str = "pubmed_memory";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in the rendered transcript.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Append-only, insertion-ordered list of messages.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// One question and the reply it produced.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exchange {
    pub input: String,
    pub output: String,
}

/// Conversation buffer holding every exchange of a session.
///
/// Nothing inside the chatbot reads it back; it is exposed so the history can
/// be fed to another chain later (see `/api/memory`).
#[derive(Clone, Debug, Default, Serialize)]
pub struct Memory {
    exchanges: Vec<Exchange>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> &'static str {
        MEMORY_KEY
    }

    pub fn record(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.exchanges.push(Exchange {
            input: input.into(),
            output: output.into(),
        });
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Flattens the buffer into alternating user/assistant messages.
    pub fn as_messages(&self) -> Vec<Message> {
        self.exchanges
            .iter()
            .flat_map(|ex| {
                [
                    Message {
                        role: Role::User,
                        content: ex.input.clone(),
                    },
                    Message {
                        role: Role::Assistant,
                        content: ex.output.clone(),
                    },
                ]
            })
            .collect()
    }
}

/// Everything one browser session owns. Lives from session start to end.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub transcript: Transcript,
    pub memory: Memory,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            transcript: Transcript::new(),
            memory: Memory::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
