//! Turns one user message into one assistant reply.
//!
//! For every turn the responder:
//! 1. Loads the session history and makes sure it opens with a system prompt
//! 2. Appends the user message and trims the history to its window
//! 3. Calls the model and sanitizes the reply
//! 4. Asks the model to continue while the reply looks cut off
//! 5. Saves the history with the final reply

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;
use crate::history::{HistoryError, HistoryKey, HistoryStore, window};
use crate::llm::{LlmDriver, LlmError, Message, MessageRole};
use crate::sanitize::{Sanitizer, is_truncated};

/// User message sent when a reply needs continuing.
pub const CONTINUE_PROMPT: &str = "Por favor, continue a resposta anterior.";

/// Default system prompt, naming the assistant `assistant_name`.
#[must_use]
pub fn default_system_prompt(assistant_name: &str) -> String {
    format!(
        "Você é um assistente grandioso, de tom épico e homérico: fale como um narrador clássico, \
         com frases de impacto e imagens poéticas. Palavrões ocasionais são permitidos para dar ênfase, \
         desde que a clareza seja mantida. Explique conceitos complexos passo a passo e dê exemplos \
         quando necessário. Nunca diga nem revele que você é 'ChatGPT', 'OpenAI' ou 'GPT'; \
         ao se referir a si mesmo, use o nome '{assistant_name}'. Em respostas longas, priorize \
         completude e clareza. Se a pergunta exigir mais contexto, peça educadamente mais informações."
    )
}

/// Why a turn produced no reply.
#[derive(Error, Debug)]
pub enum RespondError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Erro interno: {0}")]
    History(#[from] HistoryError),
}

/// One incoming chat message, with identifiers already resolved.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub client_id: String,
    pub session_id: String,
    pub message: String,
    /// Overrides the default prompt when the session has none yet.
    pub system_prompt: Option<String>,
}

/// Chat responder over an [`LlmDriver`] and a [`HistoryStore`].
#[derive(Clone)]
pub struct Responder {
    driver: Arc<dyn LlmDriver>,
    history: HistoryStore,
    sanitizer: Sanitizer,
    default_prompt: String,
    max_continuations: u32,
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("history", &self.history)
            .field("max_continuations", &self.max_continuations)
            .finish_non_exhaustive()
    }
}

impl Responder {
    /// Create a responder configured from `config`.
    pub fn new(
        config: &AppConfig,
        driver: Arc<dyn LlmDriver>,
        history: HistoryStore,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            driver,
            history,
            sanitizer: Sanitizer::new(config.llm.assistant_name.clone())?,
            default_prompt: default_system_prompt(&config.llm.assistant_name),
            max_continuations: config.llm.max_continuations,
        })
    }

    /// The history store backing this responder.
    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Produce the reply to `turn`, updating the session history.
    ///
    /// On error the history is left as it was before the turn.
    pub async fn respond(&self, turn: ChatTurn) -> Result<String, RespondError> {
        let key = HistoryKey::new(&turn.client_id, &turn.session_id);
        let size = self.history.window_size();

        let mut history = self.history.get(&key).await?;
        if history.first().is_none_or(|m| m.role != MessageRole::System) {
            let prompt = turn
                .system_prompt
                .unwrap_or_else(|| self.default_prompt.clone());
            history.insert(0, Message::system(prompt));
        }
        history.push(Message::user(turn.message));
        window(&mut history, size);

        let mut reply = self.ask(&history).await?;

        let mut continuations = 0;
        while is_truncated(&reply) && continuations < self.max_continuations {
            continuations += 1;
            history.push(Message::assistant(reply.clone()));
            history.push(Message::user(CONTINUE_PROMPT));
            window(&mut history, size);

            let more = self.ask(&history).await?;
            reply = format!("{reply}\n{more}").trim().to_string();
        }

        info!(
            name: "chat.reply.ready",
            session_id = %turn.session_id,
            continuations,
            chars = reply.len(),
            "Reply ready"
        );

        history.push(Message::assistant(reply.clone()));
        self.history.save(&key, history).await?;
        Ok(reply)
    }

    async fn ask(&self, history: &[Message]) -> Result<String, LlmError> {
        let raw = self.driver.complete(history).await?;
        Ok(self.sanitizer.sanitize(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Driver replying from a script and recording what it was sent.
    struct ScriptedDriver {
        replies: Mutex<Vec<String>>,
        calls: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedDriver {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(ToString::to_string).collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<Message>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl LlmDriver for ScriptedDriver {
        async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| LlmError::Malformed("script exhausted".to_string()))
        }
    }

    fn responder(driver: Arc<ScriptedDriver>, window: usize, continuations: u32) -> Responder {
        let mut config = AppConfig::default();
        config.llm.assistant_name = "Athos".to_string();
        config.llm.max_continuations = continuations;
        Responder::new(
            &config,
            driver,
            HistoryStore::memory(window, Duration::from_secs(60)),
        )
        .unwrap()
    }

    fn turn(message: &str) -> ChatTurn {
        ChatTurn {
            client_id: "public".to_string(),
            session_id: "sess_1".to_string(),
            message: message.to_string(),
            system_prompt: None,
        }
    }

    #[tokio::test]
    async fn test_first_turn_gets_system_prompt() {
        let driver = ScriptedDriver::new(&["Salve!"]);
        let responder = responder(Arc::clone(&driver), 20, 1);

        let reply = responder.respond(turn("Olá")).await.unwrap();
        assert_eq!(reply, "Salve!");

        let sent = &driver.calls()[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, MessageRole::System);
        assert!(sent[0].content.contains("Athos"));
        assert_eq!(sent[1], Message::user("Olá"));

        let stored = responder
            .history()
            .get(&HistoryKey::new("public", "sess_1"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2], Message::assistant("Salve!"));
    }

    #[tokio::test]
    async fn test_custom_system_prompt() {
        let driver = ScriptedDriver::new(&["Ok."]);
        let responder = responder(Arc::clone(&driver), 20, 0);

        let mut t = turn("Olá");
        t.system_prompt = Some("Seja breve.".to_string());
        responder.respond(t).await.unwrap();

        assert_eq!(driver.calls()[0][0], Message::system("Seja breve."));
    }

    #[tokio::test]
    async fn test_history_carries_across_turns() {
        let driver = ScriptedDriver::new(&["Um.", "Dois."]);
        let responder = responder(Arc::clone(&driver), 20, 1);

        responder.respond(turn("1")).await.unwrap();
        responder.respond(turn("2")).await.unwrap();

        let second = &driver.calls()[1];
        let roles: Vec<_> = second.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
    }

    #[tokio::test]
    async fn test_reply_is_sanitized() {
        let driver = ScriptedDriver::new(&["Sou o ChatGPT da OpenAI."]);
        let responder = responder(driver, 20, 0);
        let reply = responder.respond(turn("Quem é você?")).await.unwrap();
        assert_eq!(reply, "Sou o Athos da Athos.");
    }

    #[tokio::test]
    async fn test_truncated_reply_is_continued() {
        let driver = ScriptedDriver::new(&["E então o herói", "partiu para Ítaca."]);
        let responder = responder(Arc::clone(&driver), 20, 1);

        let reply = responder.respond(turn("Conte")).await.unwrap();
        assert_eq!(reply, "E então o herói\npartiu para Ítaca.");

        let calls = driver.calls();
        assert_eq!(calls.len(), 2);
        let followup = calls[1].last().unwrap();
        assert_eq!(followup, &Message::user(CONTINUE_PROMPT));
    }

    #[tokio::test]
    async fn test_continuations_are_bounded() {
        let driver = ScriptedDriver::new(&["a", "b", "c"]);
        let responder = responder(Arc::clone(&driver), 20, 1);

        let reply = responder.respond(turn("x")).await.unwrap();
        assert_eq!(reply, "a\nb");
        assert_eq!(driver.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_history_window_applied() {
        let driver = ScriptedDriver::new(&["1.", "2.", "3."]);
        let responder = responder(Arc::clone(&driver), 4, 0);

        for m in ["a", "b", "c"] {
            responder.respond(turn(m)).await.unwrap();
        }

        let stored = responder
            .history()
            .get(&HistoryKey::new("public", "sess_1"))
            .await
            .unwrap();
        assert_eq!(stored.len(), 4);
        assert!(driver.calls().iter().all(|sent| sent.len() <= 4));
    }

    #[tokio::test]
    async fn test_failure_leaves_history_untouched() {
        let driver = ScriptedDriver::new(&[]);
        let responder = responder(driver, 20, 0);

        let err = responder.respond(turn("x")).await.unwrap_err();
        assert!(matches!(err, RespondError::Llm(LlmError::Malformed(_))));
        let stored = responder
            .history()
            .get(&HistoryKey::new("public", "sess_1"))
            .await
            .unwrap();
        assert!(stored.is_empty());
    }
}
