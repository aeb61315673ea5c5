//! OpenAI-compatible Chat Completions driver.

use std::time::Duration;

use tracing::debug;

use crate::config::LlmConfig;

use super::{LlmDriver, LlmError, Message, Provider};

/// Driver for a Chat Completions endpoint.
///
/// Posts `{model, messages, max_tokens, temperature}` with bearer auth and
/// reads `choices[0].message.content`.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmConfig,
    provider: Provider,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("endpoint", &self.settings.endpoint)
            .field("model", &self.settings.model)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsDriver {
    /// Create a driver with the given settings.
    pub fn new(settings: LlmConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        let provider = Provider::detect_from_url(&settings.endpoint);
        Ok(Self {
            http,
            settings,
            provider,
        })
    }

    /// Detected provider.
    #[must_use]
    pub fn provider(&self) -> Provider {
        self.provider
    }

    fn http_error(&self, source: reqwest::Error) -> LlmError {
        LlmError::Http {
            provider: self.provider.display_name(),
            source,
        }
    }
}

#[async_trait::async_trait]
impl LlmDriver for ChatCompletionsDriver {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let api_key = self.settings.api_key().ok_or(LlmError::MissingApiKey)?;

        let body = serde_json::json!({
            "model": self.settings.model,
            "messages": messages,
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
        });

        debug!(
            name: "llm.request.sent",
            model = %self.settings.model,
            messages = messages.len(),
            "Calling chat completions"
        );

        // An unreadable body is a provider failure, like an error status.
        let value: serde_json::Value = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| self.http_error(e))?
            .json()
            .await
            .map_err(|e| self.http_error(e))?;

        extract_reply(&value)
    }
}

/// Reply text of a Chat Completions body, trimmed.
///
/// A body without `choices` yields an empty reply; an empty `choices` list is
/// malformed.
fn extract_reply(value: &serde_json::Value) -> Result<String, LlmError> {
    let Some(choices) = value.get("choices") else {
        return Ok(String::new());
    };
    let choice = choices
        .get(0)
        .ok_or_else(|| LlmError::Malformed("resposta sem choices".to_string()))?;

    Ok(choice["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .trim()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_reply() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "  Olá!  "}}]});
        assert_eq!(extract_reply(&body).unwrap(), "Olá!");
    }

    #[test]
    fn test_extract_reply_without_choices() {
        assert_eq!(extract_reply(&json!({})).unwrap(), "");
    }

    #[test]
    fn test_extract_reply_without_content() {
        let body = json!({"choices": [{"message": {}}]});
        assert_eq!(extract_reply(&body).unwrap(), "");
    }

    #[test]
    fn test_extract_reply_empty_choices() {
        let err = extract_reply(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, LlmError::Malformed(_)));
    }

    /// Serve `body` with status 200 on an ephemeral port; returns the endpoint URL.
    async fn serve_body(body: &'static str) -> String {
        let app = axum::Router::new().route(
            "/v1/chat/completions",
            axum::routing::post(move || async move { body }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1/chat/completions")
    }

    fn driver_for(endpoint: String) -> ChatCompletionsDriver {
        let mut settings = crate::config::AppConfig::default().llm;
        settings.endpoint = endpoint;
        settings.api_key = Some("gsk_test".to_string());
        ChatCompletionsDriver::new(settings).unwrap()
    }

    #[tokio::test]
    async fn test_reads_reply_from_provider() {
        let endpoint =
            serve_body(r#"{"choices": [{"message": {"role": "assistant", "content": " Salve! "}}]}"#).await;
        let reply = driver_for(endpoint).complete(&[Message::user("oi")]).await.unwrap();
        assert_eq!(reply, "Salve!");
    }

    #[tokio::test]
    async fn test_non_json_body_is_provider_error() {
        let endpoint = serve_body("<html>bad gateway</html>").await;
        let err = driver_for(endpoint)
            .complete(&[Message::user("oi")])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Http { provider: "LLM", .. }));
        assert!(err.to_string().starts_with("LLM error: "));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let driver = ChatCompletionsDriver::new(crate::config::AppConfig::default().llm).unwrap();
        let err = driver.complete(&[Message::user("oi")]).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
        assert_eq!(driver.provider(), Provider::Groq);
    }
}
