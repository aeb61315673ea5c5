//! Chat backend for the embeddable chat widget.
//!
//! Serves `POST /chat` for widgets embedded on any origin, keeps a short
//! per-session history and answers through an OpenAI-compatible model.
//!
//! # Architecture
//!
//! - **Server**: Axum router with permissive CORS and request tracing
//! - **Responder**: System prompt, history window, continuation and sanitization
//! - **LLM**: Chat Completions driver (Groq by default) or a test-mode echo
//! - **History**: Windowed, expiring per-session storage in Redis or memory
//!
//! # Modules
//!
//! - [`config`]: Layered configuration (defaults, YAML, env, CLI)
//! - [`history`]: Per-session conversation history
//! - [`llm`]: LLM driver trait and implementations
//! - [`page`]: Host page embedding the widget
//! - [`responder`]: One reply per user message
//! - [`sanitize`]: Reply post-processing
//! - [`server`]: HTTP routes and startup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod history;
pub mod llm;
pub mod page;
pub mod responder;
pub mod sanitize;
pub mod server;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::history::HistoryStore;
use crate::llm::{ChatCompletionsDriver, EchoDriver, LlmDriver};
use crate::responder::Responder;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Produces replies and owns the history store.
    pub responder: Arc<Responder>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build the state for `config`, picking the echo driver in test mode
    /// and Redis history when it is configured and reachable.
    pub async fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let driver: Arc<dyn LlmDriver> = if config.llm.test_mode {
            Arc::new(EchoDriver)
        } else {
            Arc::new(ChatCompletionsDriver::new(config.llm.clone())?)
        };
        Self::with_driver(config, driver).await
    }

    /// Build the state around an explicit driver.
    pub async fn with_driver(
        config: Arc<AppConfig>,
        driver: Arc<dyn LlmDriver>,
    ) -> anyhow::Result<Self> {
        let history = HistoryStore::connect(&config.history).await;
        let responder = Arc::new(Responder::new(&config, driver, history)?);
        Ok(Self { responder, config })
    }
}
