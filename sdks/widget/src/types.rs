//! Shared types for the widget.
//!
//! The request/reply types mirror the `/chat` wire contract of the backend.

use serde::{Deserialize, Serialize};

/// Text of the transient bot entry shown while a reply is pending.
pub const PLACEHOLDER_TEXT: &str = "...";

/// Bot text shown when the endpoint could not be reached or decoded.
pub const CONNECTION_ERROR_TEXT: &str = "Erro de conexão";

/// Prefix for application errors reported by the endpoint.
pub const ERROR_PREFIX: &str = "Erro: ";

/// Id prefix used when the host page does not pick one.
pub const DEFAULT_ID_PREFIX: &str = "chat";

// =============================================================================
// Log
// =============================================================================

/// Who wrote a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    /// The person typing into the widget.
    User,
    /// The remote chat endpoint.
    Bot,
}

/// A single entry in the message log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Author of the entry.
    pub author: Author,
    /// Entry text, possibly empty.
    pub text: String,
}

impl Message {
    /// Create a log entry.
    pub fn new(author: Author, text: impl Into<String>) -> Self {
        Self {
            author,
            text: text.into(),
        }
    }

    /// Whether this entry is the pending-reply placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.author == Author::Bot && self.text == PLACEHOLDER_TEXT
    }
}

/// Identifiers sent with every message, fixed for the widget's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    client_id: String,
    session_id: String,
}

impl Session {
    /// Create a session from host-supplied identifiers.
    pub fn new(client_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Session identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

// =============================================================================
// Wire types
// =============================================================================

/// Body of `POST {api_base}/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message, trimmed.
    pub message: String,
    /// Client identifier.
    pub client_id: String,
    /// Session identifier.
    pub session_id: String,
}

impl ChatRequest {
    /// Build a request for `message` within `session`.
    pub fn new(message: impl Into<String>, session: &Session) -> Self {
        Self {
            message: message.into(),
            client_id: session.client_id.clone(),
            session_id: session.session_id.clone(),
        }
    }
}

/// Parsed reply from the chat endpoint.
///
/// Unknown fields (such as the echoed `session_id`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Application error reported by the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Assistant reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl ChatReply {
    /// A successful reply.
    pub fn response(text: impl Into<String>) -> Self {
        Self {
            error: None,
            response: Some(text.into()),
        }
    }

    /// An application error reply.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            error: Some(text.into()),
            response: None,
        }
    }

    /// Text of the bot entry that represents this reply.
    ///
    /// An empty `error` counts as absent.
    #[must_use]
    pub fn render(&self) -> String {
        match self.error.as_deref() {
            Some(error) if !error.is_empty() => format!("{ERROR_PREFIX}{error}"),
            _ => self.response.clone().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Everything the host page supplies to a widget instance.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Base URL of the chat backend (`/chat` is appended).
    pub api_base: String,
    /// Identifiers sent with every message.
    pub session: Session,
    /// Id of the log container element.
    pub log_id: String,
    /// Id of the text input element.
    pub input_id: String,
    /// Id of the send button element.
    pub button_id: String,
}

impl WidgetConfig {
    /// Create a config using the default element ids (`chat-log`, `chat-input`, `chat-send`).
    pub fn new(api_base: impl Into<String>, session: Session) -> Self {
        Self {
            api_base: api_base.into(),
            session,
            log_id: String::new(),
            input_id: String::new(),
            button_id: String::new(),
        }
        .with_id_prefix(DEFAULT_ID_PREFIX)
    }

    /// Derive element ids from `prefix`, so several widgets can share a page.
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: &str) -> Self {
        self.log_id = format!("{prefix}-log");
        self.input_id = format!("{prefix}-input");
        self.button_id = format!("{prefix}-send");
        self
    }
}
