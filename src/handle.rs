//! WsHandle - a `Stream` + `Sink` view of a [`WebSocket`]

use std::cell::RefCell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::{Sink, Stream};
use pin_project_lite::pin_project;
use tokio::sync::mpsc;

use crate::error::{WsError, WsResult};
use crate::message::WsMessage;
use crate::registry::HandlerRegistration;
use crate::socket::{SocketEvents, WebSocket};
use crate::state::ReadyState;

pin_project! {
    /// A handle to a websocket usable from async code.
    ///
    /// `WsHandle` implements both `Sink` and `Stream`, allowing you to:
    /// - Send messages via `Sink::send()` or `SinkExt::send()`
    /// - Receive messages via `Stream::poll_next()` or `StreamExt::next()`
    ///
    /// Incoming events are fed into a channel by handlers registered on the
    /// socket. The stream yields messages and error events; after the close
    /// event it yields [`WsError::ConnectionClosed`] once and then ends.
    /// Sending waits for the socket to open.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use wasm_socket_bindings::{WsHandle, WsMessage};
    /// use futures::{SinkExt, StreamExt};
    ///
    /// async fn example() {
    ///     let mut ws = WsHandle::new("ws://example.com").unwrap();
    ///
    ///     // Send a message
    ///     ws.send(WsMessage::Text("Hello".to_string())).await.unwrap();
    ///
    ///     // Receive messages
    ///     if let Some(Ok(msg)) = ws.next().await {
    ///         println!("Received: {:?}", msg);
    ///     }
    /// }
    /// ```
    pub struct WsHandle {
        #[pin]
        rx_msg: mpsc::UnboundedReceiver<WsResult<WsMessage>>,
        socket: WebSocket,
        ready_waker: Rc<RefCell<Option<Waker>>>,
        registrations: Vec<HandlerRegistration>,
        terminated: bool,
    }

    impl PinnedDrop for WsHandle {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            for registration in this.registrations.drain(..) {
                registration.remove();
            }
        }
    }
}

impl WsHandle {
    /// Create a new websocket and wrap it
    ///
    /// # Errors
    ///
    /// See [`WebSocket::new`].
    pub fn new(url: &str) -> WsResult<Self> {
        Ok(Self::from_socket(WebSocket::new(url)?))
    }

    /// Wrap an existing socket
    ///
    /// Only events fired after this call reach the stream. A socket that is
    /// already closed fires no more events, so its stream ends at once.
    pub fn from_socket(socket: WebSocket) -> Self {
        let (tx_msg, rx_msg) = mpsc::unbounded_channel();
        let ready_waker: Rc<RefCell<Option<Waker>>> = Rc::new(RefCell::new(None));

        let wake = {
            let ready_waker = Rc::clone(&ready_waker);
            move || {
                if let Some(waker) = ready_waker.borrow_mut().take() {
                    waker.wake();
                }
            }
        };

        let registrations = vec![
            socket.add_open_handler({
                let wake = wake.clone();
                move |_| wake()
            }),
            socket.add_message_handler({
                let tx_msg = tx_msg.clone();
                move |event| forward(&tx_msg, Ok(event.data().clone()))
            }),
            socket.add_error_handler({
                let tx_msg = tx_msg.clone();
                move |event| {
                    forward(
                        &tx_msg,
                        Err(WsError::WebSocketError(event.message().to_owned())),
                    );
                }
            }),
            socket.add_close_handler(move |event| {
                forward(
                    &tx_msg,
                    Err(WsError::ConnectionClosed {
                        code: event.code(),
                        reason: event.reason().to_owned(),
                    }),
                );
                wake();
            }),
        ];

        let terminated = socket.ready_state() == ReadyState::Closed;
        if terminated {
            tracing::debug!(url = %socket.url(), "WsHandle wraps a closed socket");
        }

        Self {
            rx_msg,
            socket,
            ready_waker,
            registrations,
            terminated,
        }
    }

    /// The wrapped socket
    pub fn socket(&self) -> &WebSocket {
        &self.socket
    }

    /// Manually close the websocket connection
    ///
    /// # Errors
    ///
    /// See [`WebSocket::close`].
    pub fn close(&self) -> WsResult<()> {
        self.socket.close()
    }

    /// Check if the handle is closed
    ///
    /// Returns true once the socket is closing or closed and nothing more can
    /// be sent.
    pub fn is_closed(&self) -> bool {
        matches!(
            self.socket.ready_state(),
            ReadyState::Closing | ReadyState::Closed
        )
    }
}

/// Push an event into the stream's channel.
///
/// Fails only when a handler snapshot outlives the handle that owned the
/// receiver.
fn forward(tx_msg: &mpsc::UnboundedSender<WsResult<WsMessage>>, item: WsResult<WsMessage>) {
    if let Err(e) = tx_msg.send(item) {
        let error = WsError::from(e);
        tracing::trace!(%error, "WsHandle is gone, event not forwarded");
    }
}

// Implement Stream trait for receiving messages
impl Stream for WsHandle {
    type Item = WsResult<WsMessage>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.terminated {
            return Poll::Ready(None);
        }

        let item = this.rx_msg.poll_recv(cx);
        if let Poll::Ready(Some(Err(WsError::ConnectionClosed { .. })) | None) = &item {
            *this.terminated = true;
        }
        item
    }
}

// Implement Sink trait for sending messages
impl Sink<WsMessage> for WsHandle {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self.socket.ready_state() {
            ReadyState::Connecting => {
                *self.ready_waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
            ReadyState::Open => Poll::Ready(Ok(())),
            ReadyState::Closing | ReadyState::Closed => {
                Poll::Ready(Err(WsError::ConnectionClosed {
                    code: 0,
                    reason: "Connection closed".to_owned(),
                }))
            }
        }
    }

    fn start_send(self: Pin<&mut Self>, item: WsMessage) -> Result<(), Self::Error> {
        tracing::debug!(bytes = item.byte_len(), "Sending message through WsHandle");
        self.socket.send_message(&item)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // The host queues sends itself
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(self.socket.close())
    }
}

impl std::fmt::Debug for WsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsHandle")
            .field("socket", &self.socket)
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}
