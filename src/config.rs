//! Connection options

/// Options applied when a [`WebSocket`](crate::WebSocket) is created.
///
/// ```rust
/// use wasm_socket_bindings::WsConfig;
///
/// let config = WsConfig::new().protocol("chat.v2").protocol("chat.v1");
/// assert_eq!(config.protocols(), ["chat.v2", "chat.v1"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WsConfig {
    protocols: Vec<String>,
}

impl WsConfig {
    /// No subprotocols requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a subprotocol. The host picks at most one of the requested
    /// protocols; see [`WebSocket::protocol`](crate::WebSocket::protocol).
    #[must_use]
    pub fn protocol<S: Into<String>>(mut self, protocol: S) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    /// Requested subprotocols, in order of preference.
    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }
}
