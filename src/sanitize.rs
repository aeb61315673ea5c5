//! Post-processing of model replies.

use regex::{NoExpand, Regex};

/// Matches names the assistant must never use for itself.
const FORBIDDEN_NAMES: &str = r"(?i)\b(chat\s?gpt|open\s?ai|openai|gpt-?\d*|gpt)\b";

/// Replaces third-party model names with the configured assistant name.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    pattern: Regex,
    assistant_name: String,
}

impl Sanitizer {
    /// Create a sanitizer substituting `assistant_name`.
    pub fn new(assistant_name: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(FORBIDDEN_NAMES)?,
            assistant_name: assistant_name.into(),
        })
    }

    /// The reply with every forbidden name replaced.
    #[must_use]
    pub fn sanitize(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, NoExpand(&self.assistant_name))
            .into_owned()
    }
}

/// Whether a reply looks cut off: non-empty but not ending in `.`, `!` or `?`.
#[must_use]
pub fn is_truncated(text: &str) -> bool {
    !text.is_empty() && !text.trim().ends_with(['.', '!', '?'])
}
