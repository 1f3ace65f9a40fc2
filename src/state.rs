//! Lifecycle of a websocket as reported by the host

use std::fmt::{self, Display, Formatter};

/// Connection phase of a [`WebSocket`](crate::WebSocket).
///
/// The discriminants match the host's `readyState` numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// The handshake has not finished yet.
    Connecting = 0,
    /// Messages can be sent and received.
    Open = 1,
    /// The close handshake is in progress.
    Closing = 2,
    /// The connection is gone. Terminal.
    Closed = 3,
}

impl ReadyState {
    /// Map the host's numeric `readyState`.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Connecting),
            1 => Some(Self::Open),
            2 => Some(Self::Closing),
            3 => Some(Self::Closed),
            _ => None,
        }
    }

    /// The host's numeric `readyState`.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Whether the host may move a socket from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Open | Self::Closed)
                | (Self::Open, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }
}

impl Display for ReadyState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        })
    }
}
