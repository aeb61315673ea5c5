//! Host page embedding the widget.

/// Generate a page hosting one widget bound to `chat-log`, `chat-input` and
/// `chat-send`, talking to the server that served it.
pub fn host_page(title: &str, client_id: &str, session_id: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{ margin: 0; font-family: system-ui, sans-serif; background: #111; color: #eee; }}
        #chat {{ max-width: 640px; margin: 0 auto; height: 100vh; display: flex; flex-direction: column; }}
        #chat-log {{ flex: 1; overflow-y: auto; padding: 12px; }}
        #chat-form {{ display: flex; gap: 8px; padding: 12px; border-top: 1px solid #333; }}
        #chat-input {{ flex: 1; padding: 10px 12px; border-radius: 12px; border: 1px solid #333; background: #1b1b1b; color: #eee; }}
        #chat-send {{ padding: 10px 16px; border-radius: 12px; border: 0; background: #b30000; color: #fff; cursor: pointer; }}
    </style>
</head>
<body>
    <div id="chat">
        <div id="chat-log" aria-live="polite" aria-label="Mensagens"></div>
        <div id="chat-form">
            <input id="chat-input" type="text" placeholder="Digite sua mensagem..." autocomplete="off">
            <button id="chat-send" type="button">Enviar</button>
        </div>
    </div>
    <script type="module">
        import init, {{ mountChatWidget }} from "/static/pkg/chat_embed_widget.js";
        await init();
        mountChatWidget(window.location.origin, "{client_id}", "{session_id}", "chat");
    </script>
</body>
</html>"#)
}
