//! The boundary between a [`WebSocket`](crate::WebSocket) and whatever
//! actually implements the socket.
//!
//! The handle never drives the connection itself: it forwards calls to a
//! [`HostSocket`] and receives the host's native events through
//! [`HostCallbacks`]. On `wasm32` the platform host is the browser's
//! `WebSocket`; elsewhere it is [`UnsupportedHost`], and [`MemoryHost`] can
//! stand in for the browser.

pub mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod unsupported;
#[cfg(target_arch = "wasm32")]
mod web;

pub use memory::{MemoryHost, MemoryPeer};
#[cfg(not(target_arch = "wasm32"))]
pub use unsupported::UnsupportedHost;
#[cfg(target_arch = "wasm32")]
pub use web::WebHost;

pub use crate::socket::HostCallbacks;
use crate::error::WsResult;
use crate::state::ReadyState;

/// The host used by [`WebSocket::new`](crate::WebSocket::new).
#[cfg(target_arch = "wasm32")]
pub type PlatformHost = WebHost;
/// The host used by [`WebSocket::new`](crate::WebSocket::new).
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformHost = UnsupportedHost;

/// An environment able to open websockets.
pub trait SocketHost {
    /// Whether this environment implements websockets at all.
    fn is_supported(&self) -> bool;

    /// Start connecting to `url`, requesting `protocols`.
    ///
    /// The returned socket is in [`ReadyState::Connecting`] (or already
    /// [`ReadyState::Closed`]) and must not fire events before
    /// [`HostSocket::attach`] is called.
    ///
    /// # Errors
    ///
    /// Whatever the host raises, typically [`WsError::ConnectionError`]
    /// for a malformed URL or a scheme other than `ws`/`wss`.
    ///
    /// [`WsError::ConnectionError`]: crate::WsError::ConnectionError
    fn connect(&self, url: &str, protocols: &[String]) -> WsResult<Box<dyn HostSocket>>;
}

/// One host-native socket object.
///
/// Every method is a pass-through: the host owns the state machine and all
/// validation.
pub trait HostSocket {
    /// Route the host's native events to `callbacks`.
    fn attach(&self, callbacks: HostCallbacks);

    /// The URL as resolved by the host.
    fn url(&self) -> String;

    /// Negotiated subprotocol, empty until open or if none was chosen.
    fn protocol(&self) -> String;

    /// Current lifecycle state.
    fn ready_state(&self) -> ReadyState;

    /// Bytes queued by `send_*` but not yet transmitted.
    fn buffered_amount(&self) -> u64;

    /// Queue a text frame.
    ///
    /// # Errors
    ///
    /// Whatever the host raises, typically while still connecting.
    fn send_text(&self, text: &str) -> WsResult<()>;

    /// Queue a binary frame.
    ///
    /// # Errors
    ///
    /// Whatever the host raises, typically while still connecting.
    fn send_binary(&self, data: &[u8]) -> WsResult<()>;

    /// Start the close handshake. A no-op once closing or closed.
    ///
    /// # Errors
    ///
    /// Whatever the host raises.
    fn close(&self) -> WsResult<()>;
}
