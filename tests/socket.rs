//! Socket lifecycle and event dispatch against the in-memory host.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_socket_bindings::host::{MemoryHost, MemoryPeer};
use wasm_socket_bindings::{
    EventKind, MessageEvent, ReadyState, SocketEvents, WebSocket, WsConfig, WsError, WsMessage,
};

fn connect(host: &MemoryHost) -> (WebSocket, MemoryPeer) {
    let socket = WebSocket::with_host(host, "ws://example.com/", &WsConfig::new()).unwrap();
    let peer = host.take_peer().unwrap();
    (socket, peer)
}

/// Records every event kind fired on a socket, with a short detail.
fn record(socket: &WebSocket) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));

    socket.add_open_handler({
        let log = Rc::clone(&log);
        move |_| log.borrow_mut().push("open".to_owned())
    });
    socket.add_message_handler({
        let log = Rc::clone(&log);
        move |event| log.borrow_mut().push(format!("message {:?}", event.data()))
    });
    socket.add_error_handler({
        let log = Rc::clone(&log);
        move |_| log.borrow_mut().push("error".to_owned())
    });
    socket.add_close_handler({
        let log = Rc::clone(&log);
        move |event| log.borrow_mut().push(format!("close {}", event.code()))
    });

    log
}

#[test]
fn connecting_then_open() {
    let host = MemoryHost::new();
    let (socket, peer) = connect(&host);
    let log = record(&socket);

    assert_eq!(socket.ready_state(), ReadyState::Connecting);
    assert_eq!(socket.url(), "ws://example.com/");

    peer.accept(None);
    assert_eq!(socket.ready_state(), ReadyState::Open);
    assert_eq!(*log.borrow(), vec!["open"]);
}

#[test]
fn connecting_then_closed_on_handshake_failure() {
    let host = MemoryHost::new();
    let (socket, peer) = connect(&host);
    let log = record(&socket);

    peer.reject();
    assert_eq!(socket.ready_state(), ReadyState::Closed);
    assert_eq!(*log.borrow(), vec!["error", "close 1006"]);
}

#[test]
fn never_returns_to_connecting() {
    let host = MemoryHost::new();
    let (socket, peer) = connect(&host);
    let states = Rc::new(RefCell::new(vec![socket.ready_state()]));

    let observe = {
        let states = Rc::clone(&states);
        move |socket: &WebSocket| states.borrow_mut().push(socket.ready_state())
    };
    socket.add_open_handler({
        let observe = observe.clone();
        move |event| observe(event.source())
    });
    socket.add_close_handler(move |event| observe(event.source()));

    peer.accept(None);
    socket.close().unwrap();
    states.borrow_mut().push(socket.ready_state());
    peer.acknowledge_close();

    let states = states.borrow();
    assert_eq!(
        *states,
        vec![
            ReadyState::Connecting,
            ReadyState::Open,
            ReadyState::Closing,
            ReadyState::Closed
        ]
    );
    for pair in states.windows(2) {
        assert!(pair[0].can_transition_to(pair[1]), "{pair:?}");
    }
}

#[test]
fn message_handlers_run_once_in_registration_order() {
    let host = MemoryHost::new();
    let (socket, peer) = connect(&host);
    let calls = Rc::new(RefCell::new(Vec::new()));

    for name in ["first", "second"] {
        let calls = Rc::clone(&calls);
        socket.add_message_handler(move |event| {
            calls
                .borrow_mut()
                .push((name, event.text().map(str::to_owned)));
        });
    }

    peer.accept(None);
    peer.deliver("hello");

    assert_eq!(
        *calls.borrow(),
        vec![
            ("first", Some("hello".to_owned())),
            ("second", Some("hello".to_owned()))
        ]
    );
}

#[test]
fn removed_handler_is_not_called() {
    let host = MemoryHost::new();
    let (socket, peer) = connect(&host);
    let calls = Rc::new(RefCell::new(0));

    let registration = socket.add_message_handler({
        let calls = Rc::clone(&calls);
        move |_| *calls.borrow_mut() += 1
    });
    assert_eq!(registration.kind(), EventKind::Message);

    peer.accept(None);
    peer.deliver("one");
    assert!(registration.remove());
    peer.deliver("two");

    assert_eq!(*calls.borrow(), 1);
    assert_eq!(socket.handler_count(EventKind::Message), 0);
}

#[test]
fn close_on_closed_socket_is_a_noop() {
    let host = MemoryHost::new();
    let (socket, peer) = connect(&host);
    peer.accept(None);
    peer.close(1000, "bye");
    assert_eq!(socket.ready_state(), ReadyState::Closed);

    let log = record(&socket);
    socket.close().unwrap();

    assert_eq!(socket.ready_state(), ReadyState::Closed);
    assert!(log.borrow().is_empty());
}

#[test]
fn close_while_closing_is_a_noop() {
    let host = MemoryHost::new();
    let (socket, peer) = connect(&host);
    let log = record(&socket);

    peer.accept(None);
    socket.close().unwrap();
    socket.close().unwrap();
    assert_eq!(socket.ready_state(), ReadyState::Closing);

    peer.acknowledge_close();
    assert_eq!(*log.borrow(), vec!["open", "close 1005"]);
}

#[test]
fn send_before_open_surfaces_host_error() {
    let host = MemoryHost::new();
    let (socket, peer) = connect(&host);

    assert!(matches!(socket.send("early"), Err(WsError::SendError(_))));

    peer.accept(None);
    socket.send("on time").unwrap();
    socket.send_binary(&[1, 2, 3]).unwrap();
    assert_eq!(socket.buffered_amount(), 10);

    assert_eq!(
        peer.flush(),
        vec![WsMessage::text("on time"), WsMessage::binary(vec![1, 2, 3])]
    );
    assert_eq!(socket.buffered_amount(), 0);
}

#[test]
fn negotiated_protocol() {
    let host = MemoryHost::new();
    let config = WsConfig::new().protocol("chat.v2").protocol("chat.v1");
    let socket = WebSocket::with_host(&host, "wss://example.com/chat", &config).unwrap();
    let peer = host.take_peer().unwrap();

    assert_eq!(peer.requested_protocols(), vec!["chat.v2", "chat.v1"]);
    assert_eq!(socket.protocol(), "");

    peer.accept(Some("chat.v1"));
    assert_eq!(socket.protocol(), "chat.v1");
}

#[test]
fn invalid_scheme_is_rejected_by_host() {
    let host = MemoryHost::new();
    let error = WebSocket::with_host(&host, "https://example.com/", &WsConfig::new()).unwrap_err();

    assert!(matches!(error, WsError::ConnectionError(_)));
}

#[test]
fn unsupported_host_refuses_construction() {
    let host = MemoryHost::unsupported();
    let error = WebSocket::with_host(&host, "ws://example.com/", &WsConfig::new()).unwrap_err();

    assert_eq!(error, WsError::Unsupported);
    assert!(host.take_peer().is_none());
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn platform_without_websockets() {
    assert!(!WebSocket::available());
    assert_eq!(
        WebSocket::new("ws://example.com/").unwrap_err(),
        WsError::Unsupported
    );
}

#[test]
fn peer_disconnect_reports_abnormal_close() {
    let host = MemoryHost::new();
    let (socket, peer) = connect(&host);
    let log = record(&socket);

    peer.accept(None);
    peer.deliver(vec![7u8]);
    peer.disconnect();

    assert_eq!(
        *log.borrow(),
        vec!["open", "message Binary([7])", "error", "close 1006"]
    );
    assert_eq!(socket.ready_state(), ReadyState::Closed);
}

#[test]
fn synthetic_events_reach_handlers() {
    let host = MemoryHost::new();
    let (socket, _peer) = connect(&host);
    let log = record(&socket);

    let event = MessageEvent::new(socket.clone(), WsMessage::text("local"));
    assert_eq!(socket.fire_event(&event), 1);

    assert_eq!(*log.borrow(), vec![r#"message Text("local")"#]);
    assert_eq!(socket.ready_state(), ReadyState::Connecting);
}
