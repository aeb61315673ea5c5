//! Test-mode driver.

use super::{LlmDriver, LlmError, Message};

/// Prefix of every test-mode reply.
pub const TEST_MODE_PREFIX: &str = "[TEST_MODE] ";

/// Echoes the last message back, prefixed with [`TEST_MODE_PREFIX`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoDriver;

#[async_trait::async_trait]
impl LlmDriver for EchoDriver {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let last = messages.last().map_or("", |m| m.content.as_str());
        Ok(format!("{TEST_MODE_PREFIX}{last}"))
    }
}
