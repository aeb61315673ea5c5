//! Redis-backed history storage.
//!
//! Each history is one JSON array under its `hist:` key, written with an
//! expiry so Redis drops idle sessions on its own.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use super::HistoryError;
use super::store::{HistoryKey, window};
use crate::llm::Message;

/// History store shared through a Redis server.
#[derive(Clone)]
pub struct RedisHistory {
    conn: MultiplexedConnection,
    window: usize,
    ttl: Duration,
}

impl std::fmt::Debug for RedisHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisHistory")
            .field("window", &self.window)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl RedisHistory {
    /// Connect to `url` and check the server answers `PING`.
    pub async fn connect(url: &str, window: usize, ttl: Duration) -> Result<Self, HistoryError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(Self { conn, window, ttl })
    }

    /// Entries kept per session.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window
    }

    /// History for `key`; empty if unknown, expired or unreadable.
    pub async fn get(&self, key: &HistoryKey) -> Result<Vec<Message>, HistoryError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key.as_str()).await?;
        Ok(raw
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default())
    }

    /// Replace the history for `key`, trimmed to the window, resetting its expiry.
    pub async fn save(&self, key: &HistoryKey, mut messages: Vec<Message>) -> Result<(), HistoryError> {
        window(&mut messages, self.window);
        let body = serde_json::to_string(&messages)?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key.as_str(), body, self.ttl.as_secs())
            .await?;
        Ok(())
    }
}
