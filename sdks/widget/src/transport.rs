//! Network seam between the widget and the chat backend.

use async_trait::async_trait;
use url::Url;

use crate::error::TransportError;
use crate::types::{ChatReply, ChatRequest};

/// Sends one chat request and returns the parsed reply.
///
/// Futures are not required to be `Send`: in the browser they run on the UI
/// thread via `spawn_local`.
#[async_trait(?Send)]
pub trait ChatTransport {
    /// Post `request` to the chat endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a JSON object
    /// of the expected shape. HTTP error statuses are not errors by themselves.
    async fn post_chat(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;
}

/// reqwest-backed transport posting JSON to `{api_base}/chat`.
///
/// # Example
///
/// ```rust,no_run
/// use chat_embed_widget::{ChatRequest, ChatTransport, HttpTransport, Session};
///
/// # async fn example() -> Result<(), chat_embed_widget::TransportError> {
/// let transport = HttpTransport::new("http://localhost:5000")?;
/// let reply = transport
///     .post_chat(&ChatRequest::new("Olá", &Session::new("public", "sess_1")))
///     .await?;
/// println!("{}", reply.render());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the backend at `api_base`.
    ///
    /// `/chat` is appended to the base as-is, so path prefixes are preserved.
    pub fn new(api_base: impl AsRef<str>) -> Result<Self, TransportError> {
        Self::with_client(api_base, reqwest::Client::new())
    }

    /// Create a transport with a custom reqwest client.
    pub fn with_client(
        api_base: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Result<Self, TransportError> {
        let endpoint = Url::parse(&chat_endpoint(api_base.as_ref()))?;
        Ok(Self { endpoint, http })
    }

    /// The resolved `/chat` endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl ChatTransport for HttpTransport {
    async fn post_chat(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        // Error statuses still carry `{error}` bodies worth showing.
        let status = response.status();
        let body = response.bytes().await?;

        decode_reply(&body).map_err(|source| TransportError::Decode {
            status: status.as_u16(),
            source,
        })
    }
}

/// Parse a reply body, accepting only a JSON object.
fn decode_reply(body: &[u8]) -> Result<ChatReply, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(serde::de::Error::custom("reply body is not a JSON object"));
    }
    serde_json::from_value(value)
}

fn chat_endpoint(api_base: &str) -> String {
    format!("{}/chat", api_base.trim_end_matches('/'))
}
