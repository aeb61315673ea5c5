//! Provider detection.
//!
//! Any OpenAI-compatible endpoint works; the provider only decides how errors
//! and logs name it.

/// Known LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// `OpenAI` (api.openai.com)
    OpenAI,
    /// Azure `OpenAI` Service
    AzureOpenAI,
    /// `OpenRouter` (openrouter.ai)
    OpenRouter,
    /// Together AI (together.ai, together.xyz)
    TogetherAI,
    /// Groq (groq.com)
    Groq,
    /// Generic OpenAI-compatible provider
    Generic,
}

impl Provider {
    /// Detect provider from the endpoint URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chat_embed::llm::Provider;
    ///
    /// let provider = Provider::detect_from_url("https://api.groq.com/openai/v1/chat/completions");
    /// assert_eq!(provider, Provider::Groq);
    /// ```
    #[must_use]
    pub fn detect_from_url(url: &str) -> Self {
        let lower = url.to_lowercase();

        if lower.contains("azure.com") {
            Self::AzureOpenAI
        } else if lower.contains("openrouter.ai") {
            Self::OpenRouter
        } else if lower.contains("together.ai") || lower.contains("together.xyz") {
            Self::TogetherAI
        } else if lower.contains("groq.com") {
            Self::Groq
        } else if lower.contains("openai.com") {
            Self::OpenAI
        } else {
            Self::Generic
        }
    }

    /// Name used in error messages returned to the widget.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::AzureOpenAI => "Azure OpenAI",
            Self::OpenRouter => "OpenRouter",
            Self::TogetherAI => "Together AI",
            Self::Groq => "Groq",
            Self::Generic => "LLM",
        }
    }
}
