//! An in-process stand-in for the browser's websocket.
//!
//! [`MemoryHost`] follows the browser's observable behaviour (URL checks,
//! lifecycle, `bufferedAmount`, which calls are errors and which are silently
//! ignored) without any network. Each connection hands out a [`MemoryPeer`],
//! the remote end, which decides when the handshake completes, delivers
//! messages and closes.
//!
//! ```rust
//! use wasm_socket_bindings::host::MemoryHost;
//! use wasm_socket_bindings::{ReadyState, WebSocket, WsConfig};
//!
//! let host = MemoryHost::new();
//! let socket = WebSocket::with_host(&host, "ws://example.com/", &WsConfig::new()).unwrap();
//! let peer = host.take_peer().unwrap();
//!
//! assert_eq!(socket.ready_state(), ReadyState::Connecting);
//! peer.accept(None);
//! assert_eq!(socket.ready_state(), ReadyState::Open);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use url::Url;

use super::{HostCallbacks, HostSocket, SocketHost};
use crate::error::{WsError, WsResult};
use crate::message::WsMessage;
use crate::state::ReadyState;

/// Close code reported when the connection dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;
/// Close code reported when the close frame carried no status.
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Host whose sockets are driven by [`MemoryPeer`]s.
#[derive(Debug)]
pub struct MemoryHost {
    supported: bool,
    peers: RefCell<VecDeque<MemoryPeer>>,
}

impl MemoryHost {
    /// A host with websocket support and no connections.
    pub fn new() -> Self {
        Self {
            supported: true,
            peers: RefCell::new(VecDeque::new()),
        }
    }

    /// A host that lacks websocket support altogether.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// The remote end of the oldest connection not yet taken.
    pub fn take_peer(&self) -> Option<MemoryPeer> {
        self.peers.borrow_mut().pop_front()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SocketHost for MemoryHost {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn connect(&self, url: &str, protocols: &[String]) -> WsResult<Box<dyn HostSocket>> {
        if !self.supported {
            return Err(WsError::Unsupported);
        }

        let url = parse_url(url)?;
        let connection = Rc::new(RefCell::new(Connection {
            url: url.to_string(),
            requested_protocols: protocols.to_vec(),
            protocol: String::new(),
            state: ReadyState::Connecting,
            outbox: Vec::new(),
            callbacks: None,
        }));
        tracing::debug!(%url, "memory socket connecting");

        self.peers.borrow_mut().push_back(MemoryPeer {
            connection: Rc::clone(&connection),
        });

        Ok(Box::new(MemorySocket { connection }))
    }
}

fn parse_url(url: &str) -> WsResult<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| WsError::ConnectionError(format!("SyntaxError: invalid URL {url}: {e}")))?;

    if !matches!(parsed.scheme(), "ws" | "wss") {
        return Err(WsError::ConnectionError(format!(
            "SyntaxError: URL scheme must be ws or wss, got {}",
            parsed.scheme()
        )));
    }
    if parsed.fragment().is_some() {
        return Err(WsError::ConnectionError(format!(
            "SyntaxError: URL must not contain a fragment: {url}"
        )));
    }

    Ok(parsed)
}

struct Connection {
    url: String,
    requested_protocols: Vec<String>,
    protocol: String,
    state: ReadyState,
    /// Sent by the socket, not yet taken by the peer.
    outbox: Vec<WsMessage>,
    callbacks: Option<HostCallbacks>,
}

impl Connection {
    fn transition(&mut self, next: ReadyState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "{} -> {next} is not a websocket transition",
            self.state
        );
        tracing::debug!(url = %self.url, from = %self.state, to = %next, "memory socket transition");
        self.state = next;
    }
}

/// Run `change` on the connection, then notify the attached callbacks with
/// whatever it returned. The borrow is released before any handler runs, so
/// handlers may call back into the socket.
fn update<R>(
    connection: &RefCell<Connection>,
    change: impl FnOnce(&mut Connection) -> Option<R>,
    notify: impl FnOnce(&HostCallbacks, R),
) -> bool {
    let (callbacks, outcome) = {
        let mut connection = connection.borrow_mut();
        let outcome = change(&mut connection);
        (connection.callbacks.clone(), outcome)
    };

    match (callbacks, outcome) {
        (Some(callbacks), Some(outcome)) => {
            notify(&callbacks, outcome);
            true
        }
        (None, Some(_)) => true,
        (_, None) => false,
    }
}

struct MemorySocket {
    connection: Rc<RefCell<Connection>>,
}

impl MemorySocket {
    fn send(&self, message: WsMessage) -> WsResult<()> {
        let mut connection = self.connection.borrow_mut();
        match connection.state {
            ReadyState::Connecting => Err(WsError::SendError(
                "InvalidStateError: still in CONNECTING state".to_owned(),
            )),
            ReadyState::Open => {
                tracing::trace!(url = %connection.url, bytes = message.byte_len(), "memory socket queued message");
                connection.outbox.push(message);
                Ok(())
            }
            ReadyState::Closing | ReadyState::Closed => {
                tracing::trace!(url = %connection.url, "memory socket discarded message after close");
                Ok(())
            }
        }
    }
}

impl HostSocket for MemorySocket {
    fn attach(&self, callbacks: HostCallbacks) {
        self.connection.borrow_mut().callbacks = Some(callbacks);
    }

    fn url(&self) -> String {
        self.connection.borrow().url.clone()
    }

    fn protocol(&self) -> String {
        self.connection.borrow().protocol.clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.connection.borrow().state
    }

    fn buffered_amount(&self) -> u64 {
        self.connection
            .borrow()
            .outbox
            .iter()
            .map(|message| message.byte_len() as u64)
            .sum()
    }

    fn send_text(&self, text: &str) -> WsResult<()> {
        self.send(WsMessage::text(text))
    }

    fn send_binary(&self, data: &[u8]) -> WsResult<()> {
        self.send(WsMessage::binary(data))
    }

    fn close(&self) -> WsResult<()> {
        update(
            &self.connection,
            |connection| match connection.state {
                ReadyState::Connecting => {
                    connection.transition(ReadyState::Closed);
                    Some(true)
                }
                ReadyState::Open => {
                    connection.transition(ReadyState::Closing);
                    Some(false)
                }
                ReadyState::Closing | ReadyState::Closed => None,
            },
            |callbacks, failed| {
                if failed {
                    callbacks.error(
                        "WebSocket is closed before the connection is established".to_owned(),
                    );
                    callbacks.close(ABNORMAL_CLOSURE, String::new(), false);
                }
            },
        );
        Ok(())
    }
}

/// The remote end of a [`MemoryHost`] connection.
///
/// Methods return `false` when the call does not apply to the current
/// state, and change nothing in that case.
pub struct MemoryPeer {
    connection: Rc<RefCell<Connection>>,
}

impl MemoryPeer {
    /// The URL the socket connected to.
    pub fn url(&self) -> String {
        self.connection.borrow().url.clone()
    }

    /// Subprotocols the socket asked for.
    pub fn requested_protocols(&self) -> Vec<String> {
        self.connection.borrow().requested_protocols.clone()
    }

    /// Current state of the socket.
    pub fn state(&self) -> ReadyState {
        self.connection.borrow().state
    }

    /// Complete the handshake, optionally selecting a subprotocol.
    pub fn accept(&self, protocol: Option<&str>) -> bool {
        update(
            &self.connection,
            |connection| {
                (connection.state == ReadyState::Connecting).then(|| {
                    connection.protocol = protocol.unwrap_or_default().to_owned();
                    connection.transition(ReadyState::Open);
                })
            },
            |callbacks, ()| callbacks.open(),
        )
    }

    /// Fail the handshake.
    pub fn reject(&self) -> bool {
        update(
            &self.connection,
            |connection| {
                (connection.state == ReadyState::Connecting)
                    .then(|| connection.transition(ReadyState::Closed))
            },
            |callbacks, ()| {
                callbacks.error("WebSocket connection failed".to_owned());
                callbacks.close(ABNORMAL_CLOSURE, String::new(), false);
            },
        )
    }

    /// Deliver a message to the socket. Only possible while open or closing.
    pub fn deliver<M: Into<WsMessage>>(&self, message: M) -> bool {
        let message = message.into();
        update(
            &self.connection,
            |connection| {
                matches!(connection.state, ReadyState::Open | ReadyState::Closing).then_some(())
            },
            |callbacks, ()| callbacks.message(message),
        )
    }

    /// Fire an error event without changing state.
    pub fn raise_error(&self, message: &str) -> bool {
        update(
            &self.connection,
            |connection| (connection.state != ReadyState::Closed).then_some(()),
            |callbacks, ()| callbacks.error(message.to_owned()),
        )
    }

    /// Close from the remote side with a clean handshake.
    ///
    /// Moves an open socket through closing to closed; also completes a
    /// close the socket already started.
    pub fn close(&self, code: u16, reason: &str) -> bool {
        update(
            &self.connection,
            |connection| match connection.state {
                ReadyState::Open => {
                    connection.transition(ReadyState::Closing);
                    connection.transition(ReadyState::Closed);
                    Some(())
                }
                ReadyState::Closing => {
                    connection.transition(ReadyState::Closed);
                    Some(())
                }
                ReadyState::Connecting | ReadyState::Closed => None,
            },
            |callbacks, ()| callbacks.close(code, reason.to_owned(), true),
        )
    }

    /// Answer a close the socket started.
    pub fn acknowledge_close(&self) -> bool {
        update(
            &self.connection,
            |connection| {
                (connection.state == ReadyState::Closing)
                    .then(|| connection.transition(ReadyState::Closed))
            },
            |callbacks, ()| callbacks.close(NO_STATUS_RECEIVED, String::new(), true),
        )
    }

    /// Drop the connection without a close handshake.
    pub fn disconnect(&self) -> bool {
        update(
            &self.connection,
            |connection| match connection.state {
                ReadyState::Connecting => {
                    connection.transition(ReadyState::Closed);
                    Some(())
                }
                ReadyState::Open => {
                    connection.transition(ReadyState::Closing);
                    connection.transition(ReadyState::Closed);
                    Some(())
                }
                ReadyState::Closing => {
                    connection.transition(ReadyState::Closed);
                    Some(())
                }
                ReadyState::Closed => None,
            },
            |callbacks, ()| {
                callbacks.error("WebSocket connection lost".to_owned());
                callbacks.close(ABNORMAL_CLOSURE, String::new(), false);
            },
        )
    }

    /// Take everything the socket sent so far, clearing its buffered amount.
    pub fn flush(&self) -> Vec<WsMessage> {
        std::mem::take(&mut self.connection.borrow_mut().outbox)
    }
}

impl Debug for MemoryPeer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let connection = self.connection.borrow();
        f.debug_struct("MemoryPeer")
            .field("url", &connection.url)
            .field("state", &connection.state)
            .finish_non_exhaustive()
    }
}
