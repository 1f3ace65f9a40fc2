//! `WebSocket` - a handle to one host socket plus its typed event handlers

use std::cell::OnceCell;
use std::fmt::{self, Debug, Formatter};
use std::rc::{Rc, Weak};

use crate::config::WsConfig;
use crate::error::{WsError, WsResult};
use crate::event::{CloseEvent, ErrorEvent, EventKind, MessageEvent, OpenEvent, SocketEvent};
use crate::host::{HostSocket, PlatformHost, SocketHost};
use crate::message::WsMessage;
use crate::registry::{EventRegistry, HandlerRegistration};
use crate::state::ReadyState;

/// Registration of typed socket event handlers.
///
/// Each method takes a handler and returns a [`HandlerRegistration`] that
/// removes it again. Handlers of one kind run in registration order.
pub trait SocketEvents {
    /// Called once the handshake completes.
    fn add_open_handler<F>(&self, handler: F) -> HandlerRegistration
    where
        F: Fn(&OpenEvent) + 'static;

    /// Called for every message from the peer.
    fn add_message_handler<F>(&self, handler: F) -> HandlerRegistration
    where
        F: Fn(&MessageEvent) + 'static;

    /// Called when the host reports an error.
    fn add_error_handler<F>(&self, handler: F) -> HandlerRegistration
    where
        F: Fn(&ErrorEvent) + 'static;

    /// Called once the connection is closed.
    fn add_close_handler<F>(&self, handler: F) -> HandlerRegistration
    where
        F: Fn(&CloseEvent) + 'static;
}

/// A handle to a host websocket.
///
/// The host drives the connection: this type forwards calls to it and
/// republishes its events to registered handlers. Clones refer to the same
/// socket. When the last clone is dropped the host socket is released.
///
/// Register handlers right after construction, before control returns to
/// the host's event loop, or the open event may be missed.
///
/// ```rust,no_run
/// use wasm_socket_bindings::{SocketEvents, WebSocket};
///
/// let socket = WebSocket::new("ws://example.com/socket").unwrap();
/// socket.add_open_handler(|event| {
///     event.source().send("hello").unwrap();
/// });
/// socket.add_message_handler(|event| {
///     println!("received {:?}", event.data());
/// });
/// ```
#[derive(Clone)]
pub struct WebSocket {
    inner: Rc<Inner>,
}

struct Inner {
    host: Box<dyn HostSocket>,
    registry: OnceCell<EventRegistry>,
}

impl WebSocket {
    /// Numeric value of [`ReadyState::Connecting`].
    pub const CONNECTING: u16 = ReadyState::Connecting as u16;
    /// Numeric value of [`ReadyState::Open`].
    pub const OPEN: u16 = ReadyState::Open as u16;
    /// Numeric value of [`ReadyState::Closing`].
    pub const CLOSING: u16 = ReadyState::Closing as u16;
    /// Numeric value of [`ReadyState::Closed`].
    pub const CLOSED: u16 = ReadyState::Closed as u16;

    /// Whether the platform host implements websockets.
    ///
    /// Always `false` outside of `wasm32`.
    pub fn available() -> bool {
        PlatformHost::default().is_supported()
    }

    /// Request a connection to `url`, which must use the `ws` or `wss`
    /// scheme. The connection opens asynchronously.
    ///
    /// # Errors
    ///
    /// - [`WsError::Unsupported`] if websockets are not [`available`](Self::available).
    /// - [`WsError::ConnectionError`] with the host's error if it refuses the URL.
    pub fn new(url: &str) -> WsResult<Self> {
        Self::with_config(url, &WsConfig::default())
    }

    /// Like [`new`](Self::new), applying `config`.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_config(url: &str, config: &WsConfig) -> WsResult<Self> {
        Self::with_host(&PlatformHost::default(), url, config)
    }

    /// Request a connection through a specific host.
    ///
    /// # Errors
    ///
    /// - [`WsError::Unsupported`] if `host` does not support websockets.
    /// - Whatever the host raises when creating the socket.
    pub fn with_host(host: &dyn SocketHost, url: &str, config: &WsConfig) -> WsResult<Self> {
        if !host.is_supported() {
            tracing::warn!(url, "WebSocket requested but not supported by the host");
            return Err(WsError::Unsupported);
        }

        tracing::info!(url, protocols = ?config.protocols(), "Connecting WebSocket");
        let socket = host.connect(url, config.protocols())?;

        let inner = Rc::new_cyclic(|weak| {
            socket.attach(HostCallbacks {
                socket: Weak::clone(weak),
            });
            Inner {
                host: socket,
                registry: OnceCell::new(),
            }
        });

        Ok(Self { inner })
    }

    /// The URL as resolved by the host.
    pub fn url(&self) -> String {
        self.inner.host.url()
    }

    /// The subprotocol selected by the server, empty if none.
    pub fn protocol(&self) -> String {
        self.inner.host.protocol()
    }

    /// Current lifecycle state, as reported by the host.
    pub fn ready_state(&self) -> ReadyState {
        self.inner.host.ready_state()
    }

    /// Bytes queued for sending but not yet transmitted.
    pub fn buffered_amount(&self) -> u64 {
        self.inner.host.buffered_amount()
    }

    /// Send a text message.
    ///
    /// # Errors
    ///
    /// [`WsError::SendError`] with the host's error, typically because the
    /// socket is still connecting. Once closing or closed the host may drop
    /// the message silently instead.
    pub fn send(&self, text: &str) -> WsResult<()> {
        self.inner.host.send_text(text)
    }

    /// Send a binary message.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub fn send_binary(&self, data: &[u8]) -> WsResult<()> {
        self.inner.host.send_binary(data)
    }

    /// Send either kind of message.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub fn send_message(&self, message: &WsMessage) -> WsResult<()> {
        match message {
            WsMessage::Text(text) => self.send(text),
            WsMessage::Binary(data) => self.send_binary(data),
        }
    }

    /// Start closing the connection.
    ///
    /// The state moves toward closing and then closed, and a close event
    /// follows. Does nothing if the socket is already closing or closed.
    ///
    /// # Errors
    ///
    /// [`WsError::CloseError`] with the host's error.
    pub fn close(&self) -> WsResult<()> {
        tracing::info!(url = %self.url(), state = %self.ready_state(), "Closing WebSocket");
        self.inner.host.close()
    }

    /// Register a handler for the event type `E`.
    ///
    /// The typed `add_*_handler` methods of [`SocketEvents`] are shorthands
    /// for this.
    ///
    /// ```rust,no_run
    /// use wasm_socket_bindings::{CloseEvent, WebSocket};
    ///
    /// let socket = WebSocket::new("ws://example.com/socket").unwrap();
    /// socket.add_handler(|event: &CloseEvent| {
    ///     println!("closed with {}", event.code());
    /// });
    /// ```
    pub fn add_handler<E, F>(&self, handler: F) -> HandlerRegistration
    where
        E: SocketEvent,
        F: Fn(&E) + 'static,
    {
        E::handlers(self.ensure_handlers()).add(Rc::new(handler))
    }

    /// Run the handlers registered for `E` with `event`, as if the host had
    /// fired it. Returns the number of handlers run.
    ///
    /// Does nothing if no handler was ever registered on this socket.
    pub fn fire_event<E: SocketEvent>(&self, event: &E) -> usize {
        if let Some(registry) = self.inner.registry.get() {
            E::handlers(registry).dispatch(event)
        } else {
            tracing::trace!(kind = %E::KIND, "no handlers registered");
            0
        }
    }

    /// Number of handlers currently registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.inner
            .registry
            .get()
            .map_or(0, |registry| registry.count(kind))
    }

    /// Whether both handles refer to the same socket.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn ensure_handlers(&self) -> &EventRegistry {
        self.inner.registry.get_or_init(EventRegistry::new)
    }
}

impl SocketEvents for WebSocket {
    fn add_open_handler<F>(&self, handler: F) -> HandlerRegistration
    where
        F: Fn(&OpenEvent) + 'static,
    {
        self.add_handler::<OpenEvent, F>(handler)
    }

    fn add_message_handler<F>(&self, handler: F) -> HandlerRegistration
    where
        F: Fn(&MessageEvent) + 'static,
    {
        self.add_handler::<MessageEvent, F>(handler)
    }

    fn add_error_handler<F>(&self, handler: F) -> HandlerRegistration
    where
        F: Fn(&ErrorEvent) + 'static,
    {
        self.add_handler::<ErrorEvent, F>(handler)
    }

    fn add_close_handler<F>(&self, handler: F) -> HandlerRegistration
    where
        F: Fn(&CloseEvent) + 'static,
    {
        self.add_handler::<CloseEvent, F>(handler)
    }
}

impl Debug for WebSocket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocket")
            .field("url", &self.url())
            .field("ready_state", &self.ready_state())
            .finish_non_exhaustive()
    }
}

/// Entry points through which a host delivers its native socket events.
///
/// Each call wraps the notification into a typed event and runs the
/// handlers registered for it. Calls after the socket was dropped, or
/// before any handler was registered, do nothing.
#[derive(Clone)]
pub struct HostCallbacks {
    socket: Weak<Inner>,
}

impl HostCallbacks {
    fn socket(&self, kind: EventKind) -> Option<WebSocket> {
        let socket = self.socket.upgrade().map(|inner| WebSocket { inner });
        if socket.is_none() {
            tracing::trace!(%kind, "event for a released WebSocket");
        }
        socket
    }

    /// The handshake completed.
    pub fn open(&self) {
        tracing::info!("WebSocket connection opened");
        if let Some(socket) = self.socket(EventKind::Open) {
            socket.fire_event(&OpenEvent::new(socket.clone()));
        }
    }

    /// A message arrived.
    pub fn message(&self, data: WsMessage) {
        tracing::debug!("Received WebSocket message event");
        if let Some(socket) = self.socket(EventKind::Message) {
            socket.fire_event(&MessageEvent::new(socket.clone(), data));
        }
    }

    /// The host reported an error.
    pub fn error(&self, message: String) {
        tracing::error!("WebSocket error event: {}", message);
        if let Some(socket) = self.socket(EventKind::Error) {
            socket.fire_event(&ErrorEvent::new(socket.clone(), message));
        }
    }

    /// The connection closed.
    pub fn close(&self, code: u16, reason: String, was_clean: bool) {
        tracing::info!("WebSocket closed: code={}, reason={}", code, reason);
        if let Some(socket) = self.socket(EventKind::Close) {
            socket.fire_event(&CloseEvent::new(socket.clone(), code, reason, was_clean));
        }
    }
}

impl Debug for HostCallbacks {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCallbacks")
            .field("attached", &(self.socket.strong_count() > 0))
            .finish()
    }
}
