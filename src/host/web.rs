//! Host backed by the browser's `WebSocket`.

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{BinaryType, CloseEvent, ErrorEvent, Event, MessageEvent};

use super::{HostCallbacks, HostSocket, SocketHost};
use crate::error::{WsError, WsResult};
use crate::message::WsMessage;
use crate::state::ReadyState;

#[wasm_bindgen]
extern "C" {
    type GlobalExt;

    #[wasm_bindgen(method, getter, js_name = WebSocket)]
    fn web_socket(this: &GlobalExt) -> JsValue;
}

/// The browser (or worker) global's `WebSocket` constructor.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebHost;

impl SocketHost for WebHost {
    fn is_supported(&self) -> bool {
        let global: GlobalExt = js_sys::global().unchecked_into();
        !global.web_socket().is_undefined()
    }

    fn connect(&self, url: &str, protocols: &[String]) -> WsResult<Box<dyn HostSocket>> {
        let ws = if protocols.is_empty() {
            web_sys::WebSocket::new(url)
        } else {
            let protocols: js_sys::Array = protocols
                .iter()
                .map(|protocol| JsValue::from_str(protocol))
                .collect();
            web_sys::WebSocket::new_with_str_sequence(url, &protocols)
        }
        .map_err(|e| {
            tracing::error!("Failed to create WebSocket: {}", describe(&e));
            WsError::ConnectionError(describe(&e))
        })?;

        ws.set_binary_type(BinaryType::Arraybuffer);
        tracing::debug!(url, "WebSocket instance created");

        Ok(Box::new(WebSocketObject {
            ws,
            closures: RefCell::new(None),
        }))
    }
}

/// Keeps the JS closures alive for as long as the socket is referenced.
struct Closures {
    _on_open: Closure<dyn FnMut(Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

struct WebSocketObject {
    ws: web_sys::WebSocket,
    closures: RefCell<Option<Closures>>,
}

impl HostSocket for WebSocketObject {
    fn attach(&self, callbacks: HostCallbacks) {
        let on_open = {
            let callbacks = callbacks.clone();
            Closure::wrap(Box::new(move |_: Event| callbacks.open()) as Box<dyn FnMut(Event)>)
        };

        let on_message = {
            let callbacks = callbacks.clone();
            Closure::wrap(Box::new(move |e: MessageEvent| match decode(&e.data()) {
                Some(message) => callbacks.message(message),
                None => tracing::warn!("Ignoring WebSocket message with an unexpected payload type"),
            }) as Box<dyn FnMut(MessageEvent)>)
        };

        // The socket fires a plain `Event` on error; some hosts send an
        // `ErrorEvent` with a message.
        let on_error = {
            let callbacks = callbacks.clone();
            Closure::wrap(Box::new(move |e: Event| {
                let message = e
                    .dyn_ref::<ErrorEvent>()
                    .map_or_else(|| e.type_(), ErrorEvent::message);
                callbacks.error(message);
            }) as Box<dyn FnMut(Event)>)
        };

        let on_close = Closure::wrap(Box::new(move |e: CloseEvent| {
            callbacks.close(e.code(), e.reason(), e.was_clean());
        }) as Box<dyn FnMut(CloseEvent)>);

        self.ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        self.ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        self.ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        self.ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        *self.closures.borrow_mut() = Some(Closures {
            _on_open: on_open,
            _on_message: on_message,
            _on_error: on_error,
            _on_close: on_close,
        });
    }

    fn url(&self) -> String {
        self.ws.url()
    }

    fn protocol(&self) -> String {
        self.ws.protocol()
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::from_code(self.ws.ready_state()).unwrap_or(ReadyState::Closed)
    }

    fn buffered_amount(&self) -> u64 {
        u64::from(self.ws.buffered_amount())
    }

    fn send_text(&self, text: &str) -> WsResult<()> {
        tracing::trace!("Sending text message: {}", text);
        self.ws.send_with_str(text).map_err(|e| {
            tracing::error!("Failed to send message to WebSocket: {}", describe(&e));
            WsError::SendError(describe(&e))
        })
    }

    fn send_binary(&self, data: &[u8]) -> WsResult<()> {
        tracing::trace!("Sending binary message of {} bytes", data.len());
        self.ws.send_with_u8_array(data).map_err(|e| {
            tracing::error!("Failed to send message to WebSocket: {}", describe(&e));
            WsError::SendError(describe(&e))
        })
    }

    fn close(&self) -> WsResult<()> {
        self.ws
            .close()
            .map_err(|e| WsError::CloseError(describe(&e)))
    }
}

impl Drop for WebSocketObject {
    fn drop(&mut self) {
        // The closures are freed with `self`; the browser must not call them
        // afterwards.
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);

        if matches!(self.ready_state(), ReadyState::Connecting | ReadyState::Open) {
            tracing::info!("Closing WebSocket released by its last handle");
            if let Err(e) = self.ws.close() {
                tracing::warn!("Failed to close released WebSocket: {}", describe(&e));
            }
        }
    }
}

fn decode(data: &JsValue) -> Option<WsMessage> {
    if let Some(text) = data.as_string() {
        tracing::trace!("Received text message: {}", text);
        Some(WsMessage::Text(text))
    } else if let Some(buffer) = data.dyn_ref::<js_sys::ArrayBuffer>() {
        let data = js_sys::Uint8Array::new(buffer).to_vec();
        tracing::trace!("Received binary message of {} bytes", data.len());
        Some(WsMessage::Binary(data))
    } else {
        None
    }
}

/// Render a thrown JS value as `name: message` when it is an `Error`.
fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        format!("{}: {}", String::from(error.name()), String::from(error.message()))
    } else if let Some(text) = value.as_string() {
        text
    } else {
        format!("{value:?}")
    }
}
