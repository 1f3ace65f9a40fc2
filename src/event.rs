//! Typed events republished from the host's native socket events
//!
//! Every event carries a handle to the socket that fired it, so handlers do
//! not need to capture the socket themselves.

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use crate::message::WsMessage;
use crate::registry::{EventRegistry, Handlers};
use crate::socket::WebSocket;

mod sealed {
    use super::{EventRegistry, Handlers, Rc};

    pub trait Sealed: Sized + 'static {
        fn handlers(registry: &EventRegistry) -> &Rc<Handlers<Self>>;
    }
}

/// An event type a [`WebSocket`] dispatches.
///
/// Selects the handler list used by [`WebSocket::add_handler`] and
/// [`WebSocket::fire_event`].
pub trait SocketEvent: sealed::Sealed {
    /// The kind of event this type represents.
    const KIND: EventKind;
}

macro_rules! socket_event {
    ($ty:ty, $kind:ident, $list:ident) => {
        impl sealed::Sealed for $ty {
            fn handlers(registry: &EventRegistry) -> &Rc<Handlers<Self>> {
                &registry.$list
            }
        }

        impl SocketEvent for $ty {
            const KIND: EventKind = EventKind::$kind;
        }
    };
}

socket_event!(OpenEvent, Open, open);
socket_event!(MessageEvent, Message, message);
socket_event!(ErrorEvent, Error, error);
socket_event!(CloseEvent, Close, close);

/// The four kinds of socket event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`OpenEvent`]
    Open,
    /// [`MessageEvent`]
    Message,
    /// [`ErrorEvent`]
    Error,
    /// [`CloseEvent`]
    Close,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Message => "message",
            Self::Error => "error",
            Self::Close => "close",
        })
    }
}

/// The handshake completed and the socket is open.
#[derive(Clone, Debug)]
pub struct OpenEvent {
    socket: WebSocket,
}

impl OpenEvent {
    /// An open event fired by `socket`.
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }

    /// The socket that fired the event.
    pub fn source(&self) -> &WebSocket {
        &self.socket
    }
}

/// A message arrived from the peer.
#[derive(Clone, Debug)]
pub struct MessageEvent {
    socket: WebSocket,
    data: WsMessage,
}

impl MessageEvent {
    /// A message event carrying `data`.
    pub fn new(socket: WebSocket, data: WsMessage) -> Self {
        Self { socket, data }
    }

    /// The socket that fired the event.
    pub fn source(&self) -> &WebSocket {
        &self.socket
    }

    /// The received payload.
    pub fn data(&self) -> &WsMessage {
        &self.data
    }

    /// Shorthand for text payloads.
    pub fn text(&self) -> Option<&str> {
        self.data.as_text()
    }
}

/// The host reported an error on the socket.
#[derive(Clone, Debug)]
pub struct ErrorEvent {
    socket: WebSocket,
    message: String,
}

impl ErrorEvent {
    /// An error event with the host's description.
    pub fn new(socket: WebSocket, message: String) -> Self {
        Self { socket, message }
    }

    /// The socket that fired the event.
    pub fn source(&self) -> &WebSocket {
        &self.socket
    }

    /// Whatever description the host attached, possibly empty.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The connection is closed.
#[derive(Clone, Debug)]
pub struct CloseEvent {
    socket: WebSocket,
    code: u16,
    reason: String,
    was_clean: bool,
}

impl CloseEvent {
    /// A close event with the close frame's details.
    pub fn new(socket: WebSocket, code: u16, reason: String, was_clean: bool) -> Self {
        Self {
            socket,
            code,
            reason,
            was_clean,
        }
    }

    /// The socket that fired the event.
    pub fn source(&self) -> &WebSocket {
        &self.socket
    }

    /// Close code sent by the peer, or chosen by the host.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Close reason, empty if none was given.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Whether the close handshake completed.
    pub fn was_clean(&self) -> bool {
        self.was_clean
    }
}
