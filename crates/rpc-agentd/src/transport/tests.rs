//! Socket-level tests for both listeners.

use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use rpc_agent_config::{TransportEndpoint, TransportKind};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;

const IDLE_TIMEOUT: Duration = Duration::from_millis(400);
const MAX_FRAME: usize = 64 * 1024;

struct RunningStream {
    addr: SocketAddr,
    _handle: ListenerHandle,
}

struct RunningDatagram {
    addr: SocketAddr,
    _handle: ListenerHandle,
}

#[fixture]
fn running_stream() -> RunningStream {
    let listener =
        StreamListener::bind(&TransportEndpoint::stream("127.0.0.1", 0)).expect("bind stream");
    let addr = listener.local_addr().expect("stream address");
    let handler = FramedConnectionHandler::new(
        test_dispatcher(Duration::from_millis(100)),
        MAX_FRAME,
        IDLE_TIMEOUT,
    );
    let handle = listener.start(Arc::new(handler)).expect("start stream");
    RunningStream {
        addr,
        _handle: handle,
    }
}

#[fixture]
fn running_datagram() -> RunningDatagram {
    let listener = DatagramListener::bind(&TransportEndpoint::datagram("127.0.0.1", 0))
        .expect("bind datagram");
    let addr = listener.local_addr().expect("datagram address");
    let handle = listener
        .start(test_dispatcher(Duration::from_millis(100)))
        .expect("start datagram");
    RunningDatagram {
        addr,
        _handle: handle,
    }
}

fn echo(id: u64, message: &str) -> String {
    json!({"jsonrpc": "2.0", "method": "echo.echo", "params": {"message": message}, "id": id})
        .to_string()
}

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

#[rstest]
fn stream_round_trip(running_stream: RunningStream) {
    let mut client = StreamClient::connect(running_stream.addr);
    client.send_line(&echo(1, "hi"));
    let response = client.read_response();

    assert_eq!(response["id"], json!(1));
    assert_eq!(response["result"]["message"], json!("hi"));
}

#[rstest]
fn stream_replies_in_request_order(running_stream: RunningStream) {
    let mut client = StreamClient::connect(running_stream.addr);
    let pipelined = format!("{}\n{}\n{}\n", echo(1, "a"), echo(2, "b"), echo(3, "c"));
    client.send_raw(pipelined.as_bytes());

    let ids: Vec<Value> = (0..3).map(|_| client.read_response()["id"].clone()).collect();
    assert_eq!(ids, [json!(1), json!(2), json!(3)]);
}

#[rstest]
fn stream_reassembles_split_frames(running_stream: RunningStream) {
    let mut client = StreamClient::connect(running_stream.addr);
    let line = echo(4, "split");
    let (head, tail) = line.split_at(10);
    client.send_raw(head.as_bytes());
    std::thread::sleep(Duration::from_millis(50));
    client.send_line(tail);

    assert_eq!(client.read_response()["id"], json!(4));
}

#[rstest]
fn stream_malformed_json_keeps_connection(running_stream: RunningStream) {
    let mut client = StreamClient::connect(running_stream.addr);
    client.send_line("{not json");
    let response = client.read_response();
    assert_eq!(response["error"]["code"], json!(-32700));
    assert_eq!(response["id"], Value::Null);

    client.send_line(&echo(2, "after"));
    assert_eq!(client.read_response()["result"]["message"], json!("after"));
}

#[rstest]
fn stream_overflow_reports_and_recovers(running_stream: RunningStream) {
    let mut client = StreamClient::connect(running_stream.addr);
    client.send_raw(&vec![b'x'; MAX_FRAME + 1]);
    let response = client.read_response();
    assert_eq!(response["error"]["code"], json!(-32003));
    assert_eq!(response["id"], Value::Null);

    client.send_raw(b"tail of the oversized frame\n");
    client.send_line(&echo(5, "recovered"));
    assert_eq!(client.read_response()["id"], json!(5));
}

#[rstest]
fn stream_timeout_then_usable(running_stream: RunningStream) {
    let mut client = StreamClient::connect(running_stream.addr);
    client.send_line(r#"{"jsonrpc":"2.0","method":"test.slow","id":9}"#);
    assert_eq!(client.read_response()["error"]["code"], json!(408));

    client.send_line(&echo(10, "next"));
    assert_eq!(client.read_response()["id"], json!(10));
}

#[rstest]
fn stream_closes_idle_connections(running_stream: RunningStream) {
    let mut client = StreamClient::connect(running_stream.addr);
    assert!(client.read_line().is_none());
}

#[test]
fn stream_bind_conflict_is_reported() {
    let occupied = TcpListener::bind("127.0.0.1:0").expect("occupy port");
    let port = occupied.local_addr().expect("address").port();

    let error = StreamListener::bind(&TransportEndpoint::stream("127.0.0.1", port))
        .expect_err("port already bound");
    assert!(matches!(error, ListenerError::BindTcp { .. }));
}

#[test]
fn unresolvable_host_is_reported() {
    let error = StreamListener::bind(&TransportEndpoint::stream("host.invalid", 9101))
        .expect_err("resolution fails");
    assert!(matches!(
        error,
        ListenerError::Resolve { .. } | ListenerError::ResolveEmpty { .. }
    ));
}

#[rstest]
fn handle_reports_kind_and_joins(running_stream: RunningStream) {
    let RunningStream { _handle: handle, .. } = running_stream;
    assert_eq!(handle.kind(), TransportKind::Stream);
    handle.shutdown();
    handle.join().expect("listener exits cleanly");
}

// ---------------------------------------------------------------------------
// Datagram
// ---------------------------------------------------------------------------

#[rstest]
fn datagram_replies_to_sender(running_datagram: RunningDatagram) {
    let response = datagram_exchange(running_datagram.addr, echo(1, "udp").as_bytes());
    assert_eq!(response["id"], json!(1));
    assert_eq!(response["result"]["message"], json!("udp"));
}

#[rstest]
fn datagram_without_trailing_newline_is_accepted(running_datagram: RunningDatagram) {
    let payload = json!({"jsonrpc": "2.0", "method": "date.now", "id": "d"}).to_string();
    let response = datagram_exchange(running_datagram.addr, payload.trim_end().as_bytes());
    assert_eq!(response["id"], json!("d"));
    assert!(response["result"]["timestamp"].is_string());
}

#[rstest]
fn datagram_parse_error_has_null_id(running_datagram: RunningDatagram) {
    let response = datagram_exchange(running_datagram.addr, b"not json");
    assert_eq!(response["error"]["code"], json!(-32700));
    assert_eq!(response["id"], Value::Null);
}

#[rstest]
fn empty_datagram_still_gets_a_reply(running_datagram: RunningDatagram) {
    let response = datagram_exchange(running_datagram.addr, b"");
    assert_eq!(response["error"]["code"], json!(-32700));
}

#[rstest]
fn datagram_timeout_then_usable(running_datagram: RunningDatagram) {
    let slow = datagram_exchange(
        running_datagram.addr,
        br#"{"jsonrpc":"2.0","method":"test.slow","id":7}"#,
    );
    assert_eq!(slow["error"]["code"], json!(408));

    let next = datagram_exchange(running_datagram.addr, echo(8, "ok").as_bytes());
    assert_eq!(next["id"], json!(8));
}

#[test]
fn datagram_bind_conflict_is_reported() {
    let occupied = std::net::UdpSocket::bind("127.0.0.1:0").expect("occupy port");
    let port = occupied.local_addr().expect("address").port();

    let error = DatagramListener::bind(&TransportEndpoint::datagram("127.0.0.1", port))
        .expect_err("port already bound");
    assert!(matches!(error, ListenerError::BindUdp { .. }));
}

#[test]
fn refused_worker_thread_drops_the_peer() {
    let peer: SocketAddr = "127.0.0.1:4000".parse().expect("peer address");
    let (sender, receiver) = mpsc::channel::<()>();
    // No address space can hold this stack, so the OS refuses the thread.
    let builder = thread::Builder::new().stack_size(usize::MAX / 2);

    let started = spawn_for_peer(builder, TransportKind::Datagram, peer, move || {
        let _ = sender.send(());
    });

    assert!(!started);
    assert!(receiver.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn worker_thread_runs_the_peer() {
    let peer: SocketAddr = "127.0.0.1:4000".parse().expect("peer address");
    let (sender, receiver) = mpsc::channel::<()>();

    let started = spawn_for_peer(thread::Builder::new(), TransportKind::Stream, peer, move || {
        let _ = sender.send(());
    });

    assert!(started);
    receiver
        .recv_timeout(Duration::from_secs(2))
        .expect("worker ran");
}
