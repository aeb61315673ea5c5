//! In-process history storage.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::llm::Message;

/// Storage key for one client's session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey(String);

impl HistoryKey {
    /// Key for `session_id` of `client_id`.
    #[must_use]
    pub fn new(client_id: &str, session_id: &str) -> Self {
        Self(format!("hist:{client_id}:{session_id}"))
    }

    /// The key as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Keep only the last `size` entries.
pub fn window(messages: &mut Vec<Message>, size: usize) {
    if messages.len() > size {
        messages.drain(..messages.len() - size);
    }
}

#[derive(Debug)]
struct StoredHistory {
    messages: Vec<Message>,
    updated_at: DateTime<Utc>,
}

impl StoredHistory {
    fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        // Negative elapsed time means clock skew; keep the entry.
        (now - self.updated_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed > ttl)
    }
}

/// Thread-safe in-process store for all session histories.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    inner: Arc<MemoryHistoryInner>,
}

#[derive(Debug)]
struct MemoryHistoryInner {
    histories: RwLock<HashMap<HistoryKey, StoredHistory>>,
    window: usize,
    ttl: Duration,
}

impl MemoryHistory {
    /// Create a store keeping `window` entries per session for `ttl`.
    #[must_use]
    pub fn new(window: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(MemoryHistoryInner {
                histories: RwLock::new(HashMap::new()),
                window,
                ttl,
            }),
        }
    }

    /// Entries kept per session.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.inner.window
    }

    /// History for `key`; empty if unknown or expired.
    #[must_use]
    pub fn get(&self, key: &HistoryKey) -> Vec<Message> {
        let guard = self
            .inner
            .histories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.get(key) {
            Some(stored) if !stored.is_expired(self.inner.ttl, Utc::now()) => {
                stored.messages.clone()
            }
            _ => Vec::new(),
        }
    }

    /// Replace the history for `key`, trimmed to the window.
    pub fn save(&self, key: &HistoryKey, mut messages: Vec<Message>) {
        window(&mut messages, self.inner.window);
        let mut guard = self
            .inner
            .histories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert(
            key.clone(),
            StoredHistory {
                messages,
                updated_at: Utc::now(),
            },
        );
    }

    /// Number of stored histories, expired ones included until cleanup.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .histories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if there are no stored histories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove histories inactive for longer than the TTL.
    ///
    /// Returns the number of histories removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut guard = self
            .inner
            .histories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, stored| !stored.is_expired(self.inner.ttl, now));
        before - guard.len()
    }
}
