//! UDP receive loop for the datagram transport.
//!
//! Every datagram is one complete request. It is dispatched on its own thread
//! and the reply is sent to the datagram's source address. There is no retry,
//! ordering or delivery guarantee.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use rpc_agent_config::{TransportEndpoint, TransportKind};
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;

use super::{LISTENER_TARGET, ListenerError, ListenerHandle, resolve, spawn_for_peer};

/// Largest UDP payload carried over IPv4.
pub const MAX_DATAGRAM_BYTES: usize = 65_507;

const RECV_POLL: Duration = Duration::from_millis(100);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Bound UDP socket awaiting [`start`](Self::start).
#[derive(Debug)]
pub struct DatagramListener {
    endpoint: TransportEndpoint,
    socket: UdpSocket,
}

impl DatagramListener {
    /// Binds the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the address does not resolve or the
    /// port cannot be bound.
    pub fn bind(endpoint: &TransportEndpoint) -> Result<Self, ListenerError> {
        let addr = resolve(endpoint)?;
        let socket =
            UdpSocket::bind(addr).map_err(|source| ListenerError::BindUdp { addr, source })?;
        Ok(Self {
            endpoint: endpoint.clone(),
            socket,
        })
    }

    /// Address actually bound, useful when the configured port is `0`.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    /// Starts receiving datagrams on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Configure`] if the receive timeout cannot be
    /// set, or [`ListenerError::Spawn`] if the receive thread cannot start.
    pub fn start(self, dispatcher: Dispatcher) -> Result<ListenerHandle, ListenerError> {
        self.socket
            .set_read_timeout(Some(RECV_POLL))
            .map_err(|source| ListenerError::Configure { source })?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let Self { endpoint, socket } = self;
        let handle = thread::Builder::new()
            .name("datagram-listener".to_owned())
            .spawn(move || {
                run_receive_loop(&endpoint, &Arc::new(socket), &shutdown_flag, &dispatcher);
            })
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle::new(TransportKind::Datagram, shutdown, handle))
    }
}

fn run_receive_loop(
    endpoint: &TransportEndpoint,
    socket: &Arc<UdpSocket>,
    shutdown: &AtomicBool,
    dispatcher: &Dispatcher,
) {
    info!(
        target: LISTENER_TARGET,
        endpoint = %endpoint,
        "datagram listener active"
    );
    let mut buffer = vec![0_u8; MAX_DATAGRAM_BYTES];
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match socket.recv_from(&mut buffer) {
            Ok((size, peer)) => {
                last_error = None;
                let payload = buffer.get(..size).unwrap_or_default().to_vec();
                let socket = Arc::clone(socket);
                let dispatcher = dispatcher.clone();
                spawn_for_peer(
                    thread::Builder::new().name(format!("datagram:{peer}")),
                    TransportKind::Datagram,
                    peer,
                    move || reply(&socket, &dispatcher, &payload, peer),
                );
            }
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "datagram receive error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    info!(
        target: LISTENER_TARGET,
        endpoint = %endpoint,
        "datagram listener stopped"
    );
}

fn reply(socket: &UdpSocket, dispatcher: &Dispatcher, payload: &[u8], peer: SocketAddr) {
    debug!(
        target: LISTENER_TARGET,
        %peer,
        bytes = payload.len(),
        "datagram received"
    );
    let response = dispatcher.dispatch_bytes(payload).encode();
    if let Err(error) = socket.send_to(&response, peer) {
        warn!(
            target: LISTENER_TARGET,
            %peer,
            error = %error,
            "failed to send datagram reply"
        );
    }
}
