//! Echo example
//!
//! This example demonstrates:
//! - Registering typed handlers before the socket opens
//! - Replying from inside a handler through `event.source()`
//! - Driving the same socket through `WsHandle` as a `Stream`
//! - Sharing a typed-array buffer between views

use wasm_socket_bindings::WebSocket;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());

    wasm_bindgen_futures::spawn_local(run_echo_example());
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    println!("This example is designed to run in a WASM environment.");
    println!("WebSocket available: {}", WebSocket::available());
}

#[cfg(target_arch = "wasm32")]
async fn run_echo_example() {
    use futures::StreamExt;
    use wasm_socket_bindings::{Int8Array, SocketEvents, WsHandle, WsMessage};
    use web_sys::console;

    if !WebSocket::available() {
        console::error_1(&"This browser has no WebSocket support".into());
        return;
    }

    let ws_url = "ws://localhost:8080/socket";
    console::log_1(&format!("Connecting to {}...", ws_url).into());

    let socket = match WebSocket::new(ws_url) {
        Ok(socket) => socket,
        Err(e) => {
            console::error_1(&format!("Failed to connect: {}", e).into());
            return;
        }
    };

    // Registered before yielding to the event loop, so the open event is seen.
    socket.add_open_handler(|event| {
        let bytes = match Int8Array::from_slice(&[1, 2, 3, 4, 5]) {
            Ok(bytes) => bytes,
            Err(e) => {
                console::error_1(&format!("Allocation failed: {}", e).into());
                return;
            }
        };
        let tail = bytes.subarray(-2);
        if let Err(e) = tail.set(0, -4) {
            console::error_1(&format!("Write failed: {}", e).into());
            return;
        }

        // `bytes` sees the write made through `tail`.
        if let Err(e) = event.source().send_message(&WsMessage::from(&bytes)) {
            console::error_1(&format!("Failed to send: {}", e).into());
        }
    });

    socket.add_error_handler(|event| {
        console::error_1(&format!("Socket error: {}", event.message()).into());
    });

    let mut ws = WsHandle::from_socket(socket);
    let mut received = 0;
    while let Some(result) = ws.next().await {
        match result {
            Ok(WsMessage::Text(text)) => {
                console::log_1(&format!("Got text: {}", text).into());
            }
            Ok(WsMessage::Binary(data)) => {
                console::log_1(&format!("Got {} bytes", data.len()).into());
            }
            Err(e) => {
                console::error_1(&format!("Error: {}", e).into());
                continue;
            }
        }

        received += 1;
        if received == 3 {
            if let Err(e) = ws.close() {
                console::error_1(&format!("Failed to close: {}", e).into());
            }
        }
    }

    console::log_1(&"Stream ended".into());
}
