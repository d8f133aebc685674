//! Shared application state injected into every Axum handler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use crate::chat::ChatBot;
use crate::config::DEFAULT_SESSION_TTL_SECS;
use crate::transcript::Session;

pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Live browser sessions, keyed by cookie id.
///
/// Each session sits behind its own async mutex so a round-trip holds it for
/// the whole generate/lookup sequence without blocking other sessions.
/// Sessions idle for longer than the TTL are dropped the next time one is
/// created.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionRegistry({} sessions, ttl {:?})", self.len(), self.ttl)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Returns a live session for `id` and marks it as seen. Never creates one.
    pub fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let now = Instant::now();
        let mut map = self.lock();
        let entry = map.get_mut(&id)?;
        if now.duration_since(entry.last_seen) >= self.ttl {
            map.remove(&id);
            return None;
        }
        entry.last_seen = now;
        Some(Arc::clone(&entry.handle))
    }

    /// Returns the live session for `id`, or starts a fresh one after
    /// dropping every expired session. The bool is `true` when a new session
    /// was created.
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SessionHandle, bool) {
        if let Some(id) = id {
            if let Some(handle) = self.get(id) {
                return (id, handle, false);
            }
        }
        let now = Instant::now();
        let mut map = self.lock();
        let before = map.len();
        map.retain(|_, e| now.duration_since(e.last_seen) < self.ttl);
        if map.len() < before {
            debug!(expired = before - map.len(), "dropped idle sessions");
        }

        let session = Session::new();
        let id = session.id;
        let handle = Arc::new(tokio::sync::Mutex::new(session));
        map.insert(
            id,
            Entry {
                handle: Arc::clone(&handle),
                last_seen: now,
            },
        );
        (id, handle, true)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub bot: ChatBot,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(bot: ChatBot) -> Self {
        Self::with_session_ttl(bot, Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }

    pub fn with_session_ttl(bot: ChatBot, ttl: Duration) -> Self {
        Self {
            bot,
            sessions: Arc::new(SessionRegistry::with_ttl(ttl)),
        }
    }
}
