//! Platform host for targets without a browser.

use super::{HostSocket, SocketHost};
use crate::error::{WsError, WsResult};

/// A host that has no websocket implementation.
///
/// [`WebSocket::available()`](crate::WebSocket::available) reports `false`
/// and every connection attempt fails with [`WsError::Unsupported`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedHost;

impl SocketHost for UnsupportedHost {
    fn is_supported(&self) -> bool {
        false
    }

    fn connect(&self, url: &str, _protocols: &[String]) -> WsResult<Box<dyn HostSocket>> {
        tracing::debug!(url, "websocket requested on a target without websocket support");
        Err(WsError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_fails() {
        let host = UnsupportedHost;
        assert!(!host.is_supported());
        assert!(matches!(
            host.connect("ws://example.com/", &[]),
            Err(WsError::Unsupported)
        ));
    }
}
