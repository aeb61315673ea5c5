//! Browser binding: DOM view, event wiring and the `mountChatWidget` export.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Event, HtmlElement, HtmlInputElement, KeyboardEvent};

use crate::transport::{ChatTransport, HttpTransport};
use crate::types::{Author, DEFAULT_ID_PREFIX, Session, WidgetConfig};
use crate::view::{ChatView, EntryStyle};
use crate::widget::{ChatWidget, WidgetEvent};

type SharedWidget = Rc<RefCell<ChatWidget<DomView, HttpTransport>>>;

/// View over the host page's log container and input element.
#[derive(Debug)]
pub struct DomView {
    document: Document,
    log: HtmlElement,
    input: HtmlInputElement,
}

impl DomView {
    /// Bind to the elements named in `config`.
    pub fn bind(document: &Document, config: &WidgetConfig) -> Result<Self, JsValue> {
        Ok(Self {
            document: document.clone(),
            log: element(document, &config.log_id)?,
            input: element(document, &config.input_id)?,
        })
    }

    fn entry(&self, author: Author, text: &str) -> Result<HtmlElement, JsValue> {
        let entry: HtmlElement = self.document.create_element("div")?.unchecked_into();
        let style = entry.style();
        for (property, value) in EntryStyle::for_author(author).declarations() {
            style.set_property(property, value)?;
        }
        entry.set_text_content(Some(text));
        Ok(entry)
    }
}

impl ChatView for DomView {
    fn append_entry(&mut self, author: Author, text: &str) {
        let appended = self
            .entry(author, text)
            .and_then(|entry| self.log.append_child(&entry));
        if let Err(err) = appended {
            web_sys::console::error_2(&"chat widget: failed to append entry".into(), &err);
            return;
        }
        self.log.set_scroll_top(self.log.scroll_height());
    }

    fn remove_last_entry(&mut self) {
        let Some(last) = self.log.last_child() else {
            return;
        };
        if let Err(err) = self.log.remove_child(&last) {
            web_sys::console::error_2(&"chat widget: failed to remove entry".into(), &err);
        }
    }

    fn input_value(&self) -> String {
        self.input.value()
    }

    fn clear_input(&mut self) {
        self.input.set_value("");
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Mount a widget once the DOM is ready.
///
/// Elements are looked up as `{idPrefix}-log`, `{idPrefix}-input` and
/// `{idPrefix}-send` (prefix defaults to `chat`).
#[wasm_bindgen(js_name = mountChatWidget)]
pub fn mount_chat_widget(
    api_base: String,
    client_id: String,
    session_id: String,
    id_prefix: Option<String>,
) -> Result<(), JsValue> {
    let config = WidgetConfig::new(api_base, Session::new(client_id, session_id))
        .with_id_prefix(id_prefix.as_deref().unwrap_or(DEFAULT_ID_PREFIX));

    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("chat widget: no document"))?;

    // `readyState` is "loading" until the document has been parsed.
    if document.ready_state() != "loading" {
        return mount(&document, config);
    }

    let deferred = document.clone();
    let on_ready: Closure<dyn FnMut()> = Closure::once(move || {
        if let Err(err) = mount(&deferred, config) {
            web_sys::console::error_2(&"chat widget: mount failed".into(), &err);
        }
    });
    document.add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
    on_ready.forget();
    Ok(())
}

fn mount(document: &Document, config: WidgetConfig) -> Result<(), JsValue> {
    let view = DomView::bind(document, &config)?;
    let input = view.input.clone();
    let button: HtmlElement = element(document, &config.button_id)?;
    let transport =
        HttpTransport::new(&config.api_base).map_err(|err| JsValue::from_str(&err.to_string()))?;

    let widget: SharedWidget = Rc::new(RefCell::new(ChatWidget::new(view, transport, config.session)));

    let on_click = {
        let widget = Rc::clone(&widget);
        Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            dispatch(&widget, &WidgetEvent::SendClicked);
        })
    };
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let on_keydown = {
        let widget = Rc::clone(&widget);
        Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            dispatch(&widget, &WidgetEvent::KeyDown(event.key()));
        })
    };
    input.add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref())?;
    on_keydown.forget();

    Ok(())
}

fn dispatch(widget: &SharedWidget, event: &WidgetEvent) {
    let Some(exchange) = widget.borrow_mut().handle(event) else {
        return;
    };
    let transport = widget.borrow().transport();
    let widget = Rc::clone(widget);

    spawn_local(async move {
        let outcome = transport.post_chat(&exchange.request).await;
        widget.borrow_mut().resolve(exchange.token, outcome);
    });
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("chat widget: missing element #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("chat widget: unexpected element type for #{id}")))
}
