//! # WASM Socket Bindings
//!
//! Bindings for two browser capabilities, usable from Rust compiled to
//! WebAssembly:
//!
//! - **Typed arrays**: [`TypedArray`] views (such as [`Int8Array`]) over a
//!   shared [`ArrayBuffer`]. Views alias their buffer; creating one never
//!   copies.
//! - **WebSockets**: a [`WebSocket`] handle forwarding to the host's socket,
//!   with typed open/message/error/close handlers ([`SocketEvents`]) and a
//!   [`WsHandle`] implementing `Sink` and `Stream`.
//!
//! The host owns the socket's lifecycle and validation; this crate mirrors
//! its state and surfaces its errors unmodified. Outside the browser the
//! platform host reports no websocket support, and [`host::MemoryHost`]
//! emulates one in-process.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wasm_socket_bindings::{Int8Array, SocketEvents, WebSocket};
//!
//! let bytes = Int8Array::from_slice(&[1, 2, 3, 4, 5]).unwrap();
//! let tail = bytes.subarray(-2);
//! tail.set(0, -1).unwrap();
//! assert_eq!(bytes.get(3), Some(-1));
//!
//! if WebSocket::available() {
//!     let socket = WebSocket::new("ws://example.com/socket").unwrap();
//!     socket.add_message_handler(|event| {
//!         if let Some(text) = event.text() {
//!             tracing::info!("Received: {}", text);
//!         }
//!     });
//! }
//! ```

mod buffer;
mod config;
mod error;
mod event;
mod handle;
pub mod host;
mod message;
mod registry;
mod socket;
mod state;
mod typed_array;

pub use buffer::ArrayBuffer;
pub use config::WsConfig;
pub use error::{ArrayError, ArrayResult, WsError, WsResult};
pub use event::{CloseEvent, ErrorEvent, EventKind, MessageEvent, OpenEvent, SocketEvent};
pub use handle::WsHandle;
pub use message::WsMessage;
pub use registry::HandlerRegistration;
pub use socket::{SocketEvents, WebSocket};
pub use state::ReadyState;
pub use typed_array::{
    Element, Float32Array, Float64Array, Int16Array, Int32Array, Int8Array, TypedArray,
    Uint16Array, Uint32Array, Uint8Array,
};
