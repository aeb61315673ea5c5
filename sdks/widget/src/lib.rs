//! Embeddable chat widget.
//!
//! Renders an append-only message log and an input box, posts each user
//! submission to `{api_base}/chat` and shows the textual reply.
//!
//! # Layers
//!
//! - [`ChatWidget`]: the send/receive/render cycle (trim, append, request, reconcile)
//! - [`ChatView`]: rendering surface ([`MemoryView`] natively, a DOM view on `wasm32`)
//! - [`ChatTransport`]: network seam ([`HttpTransport`] posts JSON with reqwest)
//!
//! # Example
//!
//! ```rust,no_run
//! use chat_embed_widget::{ChatWidget, HttpTransport, MemoryView, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new("http://localhost:5000")?;
//! let session = Session::new("public", "sess_1234abcd");
//! let mut widget = ChatWidget::new(MemoryView::new(), transport, session);
//!
//! widget.view_mut().set_input("Olá!");
//! widget.send().await;
//!
//! for message in widget.view().entries() {
//!     println!("{:?}: {}", message.author, message.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! In the browser the crate is built with `wasm-pack` and mounted with
//! `mountChatWidget(apiBase, clientId, sessionId, idPrefix)`.

pub mod error;
pub mod transport;
pub mod types;
pub mod view;
pub mod widget;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::TransportError;
pub use transport::{ChatTransport, HttpTransport};
pub use types::*;
pub use view::{ChatView, EntryStyle, MemoryView};
pub use widget::{ChatWidget, PendingExchange, WidgetEvent};
