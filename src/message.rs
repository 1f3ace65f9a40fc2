//! Frames exchanged over a websocket
//!
//! Binary frames are plain byte vectors. A [`TypedArray`] view or an
//! [`ArrayBuffer`] converts into a binary frame by copying the bytes it
//! covers, and a received binary frame converts back into a fresh buffer.

use crate::buffer::ArrayBuffer;
use crate::error::{WsError, WsResult};
use crate::typed_array::{Element, TypedArray};

/// A websocket frame payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// UTF-8 text frame
    Text(String),
    /// Binary frame
    Binary(Vec<u8>),
}

impl WsMessage {
    /// A text frame
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text(text.into())
    }

    /// A binary frame
    pub fn binary<B: Into<Vec<u8>>>(data: B) -> Self {
        Self::Binary(data.into())
    }

    /// The text of a text frame.
    pub fn as_text(&self) -> Option<&str> {
        if let Self::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    /// Payload bytes; UTF-8 for text frames.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }

    /// Payload size as counted by the host's `bufferedAmount`.
    pub fn byte_len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Move a binary payload into a new [`ArrayBuffer`], ready to be viewed
    /// through a [`TypedArray`].
    ///
    /// # Errors
    ///
    /// [`WsError::InvalidMessage`] for a text frame.
    pub fn into_buffer(self) -> WsResult<ArrayBuffer> {
        match self {
            Self::Binary(data) => Ok(ArrayBuffer::from(data)),
            Self::Text(_) => Err(WsError::InvalidMessage(
                "text frame has no binary payload".to_owned(),
            )),
        }
    }
}

impl From<String> for WsMessage {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for WsMessage {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for WsMessage {
    fn from(data: Vec<u8>) -> Self {
        Self::Binary(data)
    }
}

impl From<&ArrayBuffer> for WsMessage {
    fn from(buffer: &ArrayBuffer) -> Self {
        Self::Binary(buffer.to_vec())
    }
}

/// Copies only the bytes inside the view's window.
impl<E: Element> From<&TypedArray<E>> for WsMessage {
    fn from(array: &TypedArray<E>) -> Self {
        let start = array.byte_offset();
        let bytes = array.buffer().bytes();
        Self::Binary(bytes[start..start + array.byte_length()].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed_array::{Int16Array, Int8Array};

    #[test]
    fn test_payload_bytes() {
        let text = WsMessage::text("\u{e9}t\u{e9}");
        assert_eq!(text.as_text(), Some("\u{e9}t\u{e9}"));
        assert_eq!(text.byte_len(), 5);

        let binary = WsMessage::binary(vec![1, 2, 3]);
        assert_eq!(binary.as_text(), None);
        assert_eq!(binary.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_view_copies_its_window() {
        let array = Int8Array::from_slice(&[1, 2, 3, 4, 5]).unwrap();
        let message = WsMessage::from(&array.subarray_range(1, 3));
        assert_eq!(message, WsMessage::binary(vec![2, 3]));

        // Later writes do not reach the message.
        array.set(1, 9).unwrap();
        assert_eq!(message.as_bytes(), &[2, 3]);

        let words = Int16Array::from_slice(&[-2]).unwrap();
        assert_eq!(WsMessage::from(&words).as_bytes(), &[0xfe, 0xff]);
    }

    #[test]
    fn test_into_buffer() {
        let buffer = WsMessage::binary(vec![0xff, 7]).into_buffer().unwrap();
        let view = Int8Array::with_buffer(buffer).unwrap();
        assert_eq!(view.to_vec(), vec![-1, 7]);

        assert!(matches!(
            WsMessage::text("hi").into_buffer(),
            Err(WsError::InvalidMessage(_))
        ));
    }
}
