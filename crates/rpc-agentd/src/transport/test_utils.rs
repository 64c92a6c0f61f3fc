//! Helpers shared by listener tests and behaviour suites.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use crate::dispatch::Dispatcher;
use crate::extensions::{Extension, catalogue};
use crate::registry::SharedRegistry;

use super::MAX_DATAGRAM_BYTES;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Dispatcher over the built-ins plus a `test` namespace whose `slow` method
/// sleeps for 300 ms.
pub(crate) fn test_dispatcher(call_timeout: Duration) -> Dispatcher {
    let registry = SharedRegistry::default();
    registry
        .load_bulk(catalogue(&registry))
        .expect("load built-ins");
    registry
        .register(
            Extension::builder("test")
                .handler("slow", |_| {
                    thread::sleep(Duration::from_millis(300));
                    Ok(json!("late"))
                })
                .build(),
        )
        .expect("register test extension");
    Dispatcher::new(registry, call_timeout)
}

/// Line-oriented TCP client.
pub(crate) struct StreamClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl StreamClient {
    pub(crate) fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect to stream listener");
        stream
            .set_read_timeout(Some(CLIENT_TIMEOUT))
            .expect("set read timeout");
        let writer = stream.try_clone().expect("clone stream");
        Self {
            reader: BufReader::new(stream),
            writer,
        }
    }

    /// Writes `line` followed by the frame terminator.
    pub(crate) fn send_line(&mut self, line: &str) {
        self.send_raw(line.as_bytes());
        self.send_raw(b"\n");
    }

    pub(crate) fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("write to stream");
        self.writer.flush().expect("flush stream");
    }

    /// Reads one response line; panics on EOF or timeout.
    pub(crate) fn read_response(&mut self) -> Value {
        let line = self.read_line().expect("connection closed before response");
        serde_json::from_str(&line).expect("response is JSON")
    }

    /// Reads one raw line, returning `None` once the peer has closed.
    pub(crate) fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }
}

/// Sends one datagram to `addr` and waits for the reply.
pub(crate) fn datagram_exchange(addr: SocketAddr, payload: &[u8]) -> Value {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind client socket");
    socket
        .set_read_timeout(Some(CLIENT_TIMEOUT))
        .expect("set read timeout");
    socket.send_to(payload, addr).expect("send datagram");
    let mut buffer = vec![0_u8; MAX_DATAGRAM_BYTES];
    let (size, _) = socket.recv_from(&mut buffer).expect("receive reply");
    serde_json::from_slice(buffer.get(..size).expect("reply bytes")).expect("reply is JSON")
}
