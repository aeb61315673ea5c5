//! The send/receive/render cycle.
//!
//! A submission is split in two synchronous halves around the network call:
//!
//! 1. [`ChatWidget::begin`] trims the input, appends the user entry and the
//!    `...` placeholder, and hands back a [`PendingExchange`]
//! 2. [`ChatWidget::resolve`] removes the placeholder and appends the outcome
//!
//! Hosts that keep the widget behind `Rc<RefCell<_>>` call the halves
//! separately so no borrow is held while the request is in flight;
//! [`ChatWidget::send`] chains them for everyone else.
//!
//! Only one exchange may be pending. Submissions made meanwhile are ignored,
//! and a resolution carrying a stale token is discarded.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::transport::ChatTransport;
use crate::types::{
    Author, CONNECTION_ERROR_TEXT, ChatReply, ChatRequest, PLACEHOLDER_TEXT, Session,
};
use crate::view::ChatView;

/// Input events the widget reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The send button was activated.
    SendClicked,
    /// A key was pressed while the input had focus (`KeyboardEvent.key`).
    KeyDown(String),
}

impl WidgetEvent {
    /// Whether this event submits the current input.
    #[must_use]
    pub fn submits(&self) -> bool {
        match self {
            Self::SendClicked => true,
            Self::KeyDown(key) => key == "Enter",
        }
    }
}

/// A request that has been started but not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    /// Token to hand back to [`ChatWidget::resolve`].
    pub token: u64,
    /// Body to post.
    pub request: ChatRequest,
}

/// A chat widget bound to one view, one transport and one session.
pub struct ChatWidget<V, T> {
    view: V,
    transport: Arc<T>,
    session: Session,
    pending: Option<u64>,
    next_token: u64,
}

impl<V: std::fmt::Debug, T> std::fmt::Debug for ChatWidget<V, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("view", &self.view)
            .field("session", &self.session)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl<V: ChatView, T: ChatTransport> ChatWidget<V, T> {
    /// Create a widget with an empty pending state.
    pub fn new(view: V, transport: T, session: Session) -> Self {
        Self {
            view,
            transport: Arc::new(transport),
            session,
            pending: None,
            next_token: 0,
        }
    }

    /// The rendering surface.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the rendering surface.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Shared handle to the transport, for running a request outside a borrow.
    pub fn transport(&self) -> Arc<T> {
        Arc::clone(&self.transport)
    }

    /// Identifiers sent with every message.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Whether an exchange is awaiting its reply.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Append an entry to the log and scroll it into view.
    pub fn append(&mut self, author: Author, text: &str) {
        self.view.append_entry(author, text);
    }

    /// Start an exchange from the current input.
    ///
    /// Returns `None` without touching the log when the trimmed input is
    /// empty or another exchange is still pending.
    pub fn begin(&mut self) -> Option<PendingExchange> {
        let raw = self.view.input_value();
        let message = raw.trim();
        if message.is_empty() {
            return None;
        }
        if let Some(token) = self.pending {
            debug!(
                name: "widget.exchange.ignored",
                pending = token,
                "Submission ignored while a reply is pending"
            );
            return None;
        }

        let message = message.to_string();
        self.append(Author::User, &message);
        self.view.clear_input();
        self.append(Author::Bot, PLACEHOLDER_TEXT);

        let token = self.next_token;
        self.next_token += 1;
        self.pending = Some(token);

        debug!(
            name: "widget.exchange.started",
            token,
            session_id = %self.session.session_id(),
            "Chat exchange started"
        );

        Some(PendingExchange {
            token,
            request: ChatRequest::new(message, &self.session),
        })
    }

    /// Finish the exchange identified by `token`.
    ///
    /// Returns `false` if `token` is not the pending exchange, in which case
    /// the log is left untouched.
    pub fn resolve(&mut self, token: u64, outcome: Result<ChatReply, TransportError>) -> bool {
        if self.pending != Some(token) {
            debug!(name: "widget.exchange.stale", token, "Discarding stale reply");
            return false;
        }
        self.pending = None;

        // The placeholder is the newest entry.
        self.view.remove_last_entry();

        let text = match outcome {
            Ok(reply) => reply.render(),
            Err(err) => {
                warn!(name: "widget.exchange.failed", token, error = %err, "Chat request failed");
                CONNECTION_ERROR_TEXT.to_string()
            }
        };
        self.append(Author::Bot, &text);
        true
    }

    /// React to an input event; returns the exchange it started, if any.
    pub fn handle(&mut self, event: &WidgetEvent) -> Option<PendingExchange> {
        if event.submits() { self.begin() } else { None }
    }

    /// Submit the current input and wait for the outcome.
    pub async fn send(&mut self) {
        if let Some(exchange) = self.begin() {
            self.complete(exchange).await;
        }
    }

    /// Handle an input event, completing any exchange it starts.
    pub async fn dispatch(&mut self, event: &WidgetEvent) {
        if let Some(exchange) = self.handle(event) {
            self.complete(exchange).await;
        }
    }

    async fn complete(&mut self, exchange: PendingExchange) {
        let transport = self.transport();
        let outcome = transport.post_chat(&exchange.request).await;
        self.resolve(exchange.token, outcome);
    }
}
