//! LLM driver trait and implementations.
//!
//! A driver turns a conversation into one assistant reply. The chat backend
//! never streams: the widget renders a reply only once it is complete.
//!
//! # Drivers
//!
//! - [`ChatCompletionsDriver`]: OpenAI-compatible Chat Completions endpoint (Groq by default)
//! - [`EchoDriver`]: test mode, echoes the last message without any network call

pub mod chat_completions;
pub mod echo;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use echo::EchoDriver;
pub use provider::Provider;

use thiserror::Error;

/// A message in a conversation, in the Chat Completions wire shape.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
}

impl Message {
    /// A system prompt.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// An assistant reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
    /// Assistant response.
    Assistant,
}

/// Why a reply could not be produced.
#[derive(Error, Debug)]
pub enum LlmError {
    /// No API key configured outside test mode.
    #[error("GROQ_API_KEY não configurada.")]
    MissingApiKey,

    /// The provider could not be reached or answered with an error status.
    #[error("{provider} error: {source}")]
    Http {
        /// Display name of the provider.
        provider: &'static str,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a body that has no usable reply.
    #[error("Erro interno: {0}")]
    Malformed(String),
}

/// Trait for LLM drivers.
#[async_trait::async_trait]
pub trait LlmDriver: Send + Sync {
    /// Produce the assistant reply to `messages`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply cannot be read.
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;
}
