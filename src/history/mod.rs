//! Per-session conversation history.
//!
//! Histories are keyed by client and session (`hist:{client_id}:{session_id}`),
//! trimmed to a fixed window of the most recent entries and dropped after a
//! period without activity.
//!
//! Two backends exist: Redis when `history.redis_url` is set and the server
//! answers, in-process memory otherwise.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use chat_embed::history::{HistoryKey, MemoryHistory};
//! use chat_embed::llm::Message;
//!
//! let store = MemoryHistory::new(20, Duration::from_secs(3600));
//! let key = HistoryKey::new("public", "sess_1234abcd");
//! store.save(&key, vec![Message::user("Olá!")]);
//!
//! assert_eq!(store.get(&key).len(), 1);
//! ```

mod redis_store;
mod store;

pub use redis_store::RedisHistory;
pub use store::{HistoryKey, MemoryHistory, window};

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::HistoryConfig;
use crate::llm::Message;

/// How long startup waits for Redis before falling back to memory.
const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure to read or write a stored history.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// History storage selected at startup.
#[derive(Debug, Clone)]
pub enum HistoryStore {
    Memory(MemoryHistory),
    Redis(RedisHistory),
}

impl HistoryStore {
    /// In-process store keeping `window` entries per session for `ttl`.
    #[must_use]
    pub fn memory(window: usize, ttl: Duration) -> Self {
        Self::Memory(MemoryHistory::new(window, ttl))
    }

    /// Pick the backend for `config`.
    ///
    /// Uses Redis when a URL is configured and the server answers `PING`;
    /// otherwise, or on any connection failure, keeps histories in memory.
    pub async fn connect(config: &HistoryConfig) -> Self {
        let ttl = Duration::from_secs(config.ttl_secs);
        let Some(url) = config.redis_url() else {
            return Self::memory(config.window, ttl);
        };

        let connected =
            tokio::time::timeout(REDIS_CONNECT_TIMEOUT, RedisHistory::connect(url, config.window, ttl))
                .await;
        match connected {
            Ok(Ok(redis)) => {
                info!(name: "history.redis.connected", "Storing histories in Redis");
                Self::Redis(redis)
            }
            Ok(Err(err)) => {
                warn!(name: "history.redis.unavailable", error = %err, "Redis unavailable, storing histories in memory");
                Self::memory(config.window, ttl)
            }
            Err(_) => {
                warn!(name: "history.redis.unavailable", error = "connect timed out", "Redis unavailable, storing histories in memory");
                Self::memory(config.window, ttl)
            }
        }
    }

    /// Name of the storage backend, reported by `/info`.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Redis(_) => "redis",
        }
    }

    /// Entries kept per session.
    #[must_use]
    pub fn window_size(&self) -> usize {
        match self {
            Self::Memory(store) => store.window_size(),
            Self::Redis(store) => store.window_size(),
        }
    }

    /// History for `key`; empty if unknown or expired.
    pub async fn get(&self, key: &HistoryKey) -> Result<Vec<Message>, HistoryError> {
        match self {
            Self::Memory(store) => Ok(store.get(key)),
            Self::Redis(store) => store.get(key).await,
        }
    }

    /// Replace the history for `key`, trimmed to the window.
    pub async fn save(&self, key: &HistoryKey, messages: Vec<Message>) -> Result<(), HistoryError> {
        match self {
            Self::Memory(store) => {
                store.save(key, messages);
                Ok(())
            }
            Self::Redis(store) => store.save(key, messages).await,
        }
    }
}
