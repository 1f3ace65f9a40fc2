//! Error types for typed arrays and websocket operations

use thiserror::Error;

/// Result type alias for websocket operations
pub type WsResult<T> = Result<T, WsError>;

/// Result type alias for buffer and typed array operations
pub type ArrayResult<T> = Result<T, ArrayError>;

/// Errors that can occur during websocket operations
///
/// Host failures are carried as the host's own message, unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WsError {
    /// The host environment does not implement WebSockets
    #[error("WebSockets are not supported in this environment")]
    Unsupported,

    /// The host refused to create the websocket (bad URL, bad scheme, ...)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The host refused to send a message
    #[error("Send error: {0}")]
    SendError(String),

    /// The host refused to close the websocket
    #[error("Close error: {0}")]
    CloseError(String),

    /// The websocket connection was closed
    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed {
        /// Close code from the close event
        code: u16,
        /// Close reason from the close event
        reason: String,
    },

    /// The websocket encountered an error event
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Invalid message format
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for WsError {
    fn from(e: tokio::sync::mpsc::error::SendError<T>) -> Self {
        WsError::ChannelError(format!("Failed to send message to channel: {e}"))
    }
}

/// Errors raised by buffer allocation and view construction or access
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayError {
    /// The requested number of bytes could not be allocated
    #[error("could not allocate a buffer of {0} bytes")]
    AllocationFailed(usize),

    /// The requested element count does not fit in the address space
    #[error("{length} elements of {element_size} bytes exceed the address space")]
    TooLong {
        /// Requested number of elements
        length: usize,
        /// Width of one element in bytes
        element_size: usize,
    },

    /// The byte offset is not a multiple of the element size
    #[error("start offset {byte_offset} is not a multiple of {element_size}")]
    Misaligned {
        /// Requested offset in bytes
        byte_offset: usize,
        /// Width of one element in bytes
        element_size: usize,
    },

    /// The byte length is not a multiple of the element size
    #[error("byte length {byte_length} is not a multiple of {element_size}")]
    LengthNotMultiple {
        /// Number of bytes the view would cover
        byte_length: usize,
        /// Width of one element in bytes
        element_size: usize,
    },

    /// The view would reach past the end of its buffer
    #[error(
        "view of {byte_length} bytes at offset {byte_offset} exceeds buffer of {buffer_length} bytes"
    )]
    OutOfRange {
        /// Requested offset in bytes
        byte_offset: usize,
        /// Requested view size in bytes
        byte_length: usize,
        /// Size of the buffer in bytes
        buffer_length: usize,
    },

    /// An element index outside of the view
    #[error("index {index} is out of bounds for length {length}")]
    IndexOutOfBounds {
        /// Requested element index
        index: usize,
        /// Number of elements in the view
        length: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = WsError::ConnectionClosed {
            code: 1000,
            reason: "bye".to_owned(),
        };
        assert_eq!(err.to_string(), "Connection closed: code=1000, reason=bye");

        let err = ArrayError::Misaligned {
            byte_offset: 3,
            element_size: 2,
        };
        assert_eq!(err.to_string(), "start offset 3 is not a multiple of 2");

        let err = ArrayError::TooLong {
            length: usize::MAX,
            element_size: 4,
        };
        assert_eq!(
            err.to_string(),
            format!("{} elements of 4 bytes exceed the address space", usize::MAX)
        );
    }

    #[test]
    fn test_channel_error_conversion() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<u8>();
        drop(rx);
        let err: WsError = tx.send(1).unwrap_err().into();
        assert!(matches!(err, WsError::ChannelError(_)));
    }
}
