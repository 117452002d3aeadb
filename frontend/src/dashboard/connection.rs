// Socket wiring for both targets. The browser build drives the controller from `web_sys`
// callbacks; the desktop build runs a tungstenite read loop with a writer task fed by a channel.

use dioxus::prelude::*;
use satview_shared::{Alert, CommandSink, SendError, SUBPROTOCOL};

use super::{Controller, handle_frame};

// ---------- Cross-platform WS handle ----------
#[derive(Clone)]
pub struct WsSender {
    #[cfg(target_arch = "wasm32")]
    ws: web_sys::WebSocket,

    #[cfg(not(target_arch = "wasm32"))]
    tx: tokio::sync::mpsc::UnboundedSender<String>,
}

impl CommandSink for WsSender {
    fn send_text(&self, text: &str) -> Result<(), SendError> {
        #[cfg(target_arch = "wasm32")]
        {
            self.ws
                .send_with_str(text)
                .map_err(|e| SendError::Transport(format!("{e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.tx
                .send(text.to_string())
                .map_err(|_| SendError::NotConnected)
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn connect(endpoint: &str, mut controller: Signal<Controller>) -> Result<(), String> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

    log!("[WS] connecting to {endpoint} ({SUBPROTOCOL})");

    let ws = WebSocket::new_with_str(endpoint, SUBPROTOCOL)
        .map_err(|e| format!("failed to create websocket: {e:?}"))?;
    controller.write().attach(WsSender { ws: ws.clone() });

    {
        let onopen: Closure<dyn FnMut(Event)> = Closure::new(move |_e: Event| {
            log!("[WS] open");
            controller.write().on_open();
        });
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();
    }

    {
        let onmessage: Closure<dyn FnMut(MessageEvent)> = Closure::new(move |e: MessageEvent| {
            if let Some(s) = e.data().as_string() {
                handle_frame(&s, controller);
            }
        });
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();
    }

    {
        // a plain `error` Event has no `data`; that reads back as "undefined"
        let onerror: Closure<dyn FnMut(Event)> = Closure::new(move |e: Event| {
            let detail = js_sys::Reflect::get(&e, &wasm_bindgen::JsValue::from_str("data"))
                .ok()
                .filter(|v| !v.is_undefined())
                .map(|v| v.as_string().unwrap_or_else(|| format!("{v:?}")));
            log!("[WS] error: {detail:?}");
            let alert = controller.write().on_error(detail.as_deref());
            show_alert(&alert);
        });
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();
    }

    {
        let onclose: Closure<dyn FnMut(CloseEvent)> = Closure::new(move |e: CloseEvent| {
            log!("[WS] close code={} reason='{}'", e.code(), e.reason());
            controller.write().on_close();
        });
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();
    }

    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn connect(endpoint: &str, mut controller: Signal<Controller>) -> Result<(), String> {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::{Message, client::IntoClientRequest, http::HeaderValue};

    log!("[WS] connecting to {endpoint} ({SUBPROTOCOL})");

    let mut request = endpoint
        .into_client_request()
        .map_err(|e| format!("bad endpoint {endpoint}: {e}"))?;
    request
        .headers_mut()
        .insert("Sec-WebSocket-Protocol", HeaderValue::from_static(SUBPROTOCOL));

    let ws_stream = match tokio_tungstenite::connect_async(request).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            let alert = controller.write().on_error(Some(&e.to_string()));
            show_alert(&alert);
            return Err(format!("connect failed: {e}"));
        }
    };

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    controller.write().attach(WsSender { tx });
    controller.write().on_open();
    log!("[WS] open");

    let (mut write, mut read) = ws_stream.split();

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if write.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(item) = read.next().await {
        match item {
            Ok(Message::Text(s)) => handle_frame(s.as_str(), controller),
            Ok(Message::Close(frame)) => {
                log!("[WS] close {frame:?}");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                log!("[WS] read error: {e}");
                let alert = controller.write().on_error(Some(&e.to_string()));
                show_alert(&alert);
                break;
            }
        }
    }

    writer.abort();
    controller.write().on_close();
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn show_alert(alert: &Alert) {
    if let Some(w) = web_sys::window() {
        let _ = w.alert_with_message(&alert.message);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn show_alert(alert: &Alert) {
    document::eval(&alert_script(alert));
}

/// `alert("...")` with the message escaped as a JS string literal.
#[cfg_attr(target_arch = "wasm32", allow(dead_code))]
fn alert_script(alert: &Alert) -> String {
    let literal = serde_json::to_string(&alert.message).unwrap_or_else(|_| "\"\"".to_string());
    format!("alert({literal});")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_script_escapes_the_message() {
        let alert = Alert {
            message: "WebSocket error: \"boom\"\n".to_string(),
        };
        assert_eq!(
            alert_script(&alert),
            r#"alert("WebSocket error: \"boom\"\n");"#
        );
    }

    #[test]
    fn undefined_detail_matches_the_browser_text() {
        let mut c = Controller::new();
        let alert = c.on_error(None);
        assert_eq!(alert_script(&alert), r#"alert("WebSocket error: undefined");"#);
    }
}
