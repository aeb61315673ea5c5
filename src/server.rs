use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::config::AppConfig;
use crate::history::HistoryStore;
use crate::page::host_page;
use crate::responder::{ChatTurn, RespondError};

/// How often expired histories are swept.
const HISTORY_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Client id used when a request names none.
pub const DEFAULT_CLIENT_ID: &str = "public";

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = AppState::from_config(Arc::clone(&config)).await?;

    info!(
        name: "llm.config.loaded",
        endpoint = %config.llm.endpoint,
        model = %config.llm.model,
        api_key_set = config.llm.api_key().is_some(),
        test_mode = config.llm.test_mode,
        history_backend = state.responder.history().backend(),
        "LLM configuration loaded"
    );

    // Redis expires keys itself; only the in-process store needs sweeping.
    if let HistoryStore::Memory(history) = state.responder.history() {
        let history = history.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HISTORY_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let removed = history.cleanup_expired();
                if removed > 0 {
                    info!(name: "history.swept", removed, "Expired histories removed");
                }
            }
        });
    }

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/chat", post(chat_handler))
        // Compiled widget bundle (wasm-pack output under static/pkg)
        .nest_service("/static", ServeDir::new(static_dir))
        // Widgets are embedded on arbitrary origins.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors returned to the widget as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Mensagem vazia")]
    EmptyMessage,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Respond(#[from] RespondError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::EmptyMessage | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Respond(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for `POST /chat`.
#[derive(Debug, Default, Deserialize)]
struct ChatPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    /// Older embeds send `client_name` instead of `client_id`.
    #[serde(default)]
    client_name: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    system_prompt: Option<String>,
    /// Per-client system prompts, keyed by client id. `null` counts as empty.
    #[serde(default)]
    prompt_map: Option<HashMap<String, String>>,
}

impl ChatPayload {
    /// Resolve identifiers and prompt into a turn, or reject an empty message.
    fn into_turn(self) -> Result<ChatTurn, ApiError> {
        let message = self.message.as_deref().unwrap_or_default().trim().to_string();
        if message.is_empty() {
            return Err(ApiError::EmptyMessage);
        }

        let client_id = non_empty(self.client_id)
            .or_else(|| non_empty(self.client_name))
            .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());
        let session_id = non_empty(self.session_id).unwrap_or_else(new_session_id);
        let prompt_map = self.prompt_map.unwrap_or_default();
        let system_prompt = non_empty(self.system_prompt)
            .or_else(|| non_empty(prompt_map.get(&client_id).cloned()));

        Ok(ChatTurn {
            client_id,
            session_id,
            message,
            system_prompt,
        })
    }
}

/// Response body for a successful `POST /chat`.
#[derive(Debug, Serialize)]
struct ChatReplyBody {
    response: String,
    session_id: String,
}

/// POST /chat - Answer one message.
async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> Result<Json<ChatReplyBody>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let turn = payload.into_turn()?;
    let session_id = turn.session_id.clone();

    info!(
        name: "chat.request.received",
        client_id = %turn.client_id,
        session_id = %session_id,
        chars = turn.message.len(),
        "Received chat request"
    );

    let response = state.responder.respond(turn).await.map_err(|err| {
        warn!(name: "chat.request.failed", session_id = %session_id, error = %err, "Chat request failed");
        ApiError::from(err)
    })?;

    Ok(Json(ChatReplyBody {
        response,
        session_id,
    }))
}

/// GET /health - Liveness check.
async fn health_handler() -> &'static str {
    "OK"
}

/// Runtime details for `GET /info`.
///
/// `groq_model`, `groq_key_set` and `redis` are the keys existing consumers
/// read; the provider-neutral keys carry the same facts.
#[derive(Debug, Serialize)]
struct InfoBody {
    groq_model: String,
    groq_key_set: bool,
    test_mode: bool,
    redis: bool,
    max_tokens: u32,
    model: String,
    api_key_set: bool,
    history_backend: &'static str,
}

/// GET /info - Report model and storage settings.
async fn info_handler(State(state): State<AppState>) -> Json<InfoBody> {
    let llm = &state.config.llm;
    let history = state.responder.history();
    Json(InfoBody {
        groq_model: llm.model.clone(),
        groq_key_set: llm.api_key().is_some(),
        test_mode: llm.test_mode,
        redis: matches!(history, HistoryStore::Redis(_)),
        max_tokens: llm.max_tokens,
        model: llm.model.clone(),
        api_key_set: llm.api_key().is_some(),
        history_backend: history.backend(),
    })
}

/// GET / - Demo page hosting one widget.
async fn index_handler() -> Html<String> {
    Html(host_page("Chat", DEFAULT_CLIENT_ID, &new_session_id()))
}

/// A fresh `sess_` id with 8 random hex characters.
pub fn new_session_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("sess_{}", &id[..8])
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    fn payload(message: &str) -> ChatPayload {
        ChatPayload {
            message: Some(message.to_string()),
            ..ChatPayload::default()
        }
    }

    #[test]
    fn test_new_session_id_shape() {
        let id = new_session_id();
        assert_eq!(id.len(), "sess_".len() + 8);
        assert!(id.starts_with("sess_"));
        assert!(id[5..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_session_id());
    }

    #[test]
    fn test_empty_message_rejected() {
        for message in ["", "   "] {
            assert!(matches!(
                payload(message).into_turn(),
                Err(ApiError::EmptyMessage)
            ));
        }
        assert!(matches!(
            ChatPayload::default().into_turn(),
            Err(ApiError::EmptyMessage)
        ));
    }

    #[test]
    fn test_identifier_fallbacks() {
        let turn = payload(" oi ").into_turn().unwrap();
        assert_eq!(turn.message, "oi");
        assert_eq!(turn.client_id, DEFAULT_CLIENT_ID);
        assert!(turn.session_id.starts_with("sess_"));
        assert!(turn.system_prompt.is_none());

        let turn = ChatPayload {
            client_name: Some("legacy".to_string()),
            session_id: Some("sess_fixed".to_string()),
            ..payload("oi")
        }
        .into_turn()
        .unwrap();
        assert_eq!(turn.client_id, "legacy");
        assert_eq!(turn.session_id, "sess_fixed");
    }

    #[test]
    fn test_prompt_resolution() {
        let mut prompt_map = HashMap::new();
        prompt_map.insert("acme".to_string(), "Prompt da Acme".to_string());

        let from_map = ChatPayload {
            client_id: Some("acme".to_string()),
            prompt_map: Some(prompt_map.clone()),
            ..payload("oi")
        }
        .into_turn()
        .unwrap();
        assert_eq!(from_map.system_prompt.as_deref(), Some("Prompt da Acme"));

        let explicit = ChatPayload {
            client_id: Some("acme".to_string()),
            system_prompt: Some("Explícito".to_string()),
            prompt_map: Some(prompt_map),
            ..payload("oi")
        }
        .into_turn()
        .unwrap();
        assert_eq!(explicit.system_prompt.as_deref(), Some("Explícito"));
    }

    #[test]
    fn test_null_prompt_map_is_empty() {
        let payload: ChatPayload = serde_json::from_value(serde_json::json!({
            "message": "oi",
            "client_id": "acme",
            "prompt_map": null,
        }))
        .unwrap();
        let turn = payload.into_turn().unwrap();
        assert_eq!(turn.client_id, "acme");
        assert!(turn.system_prompt.is_none());
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::EmptyMessage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Respond(RespondError::Llm(LlmError::MissingApiKey)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
