//! TCP accept loop for the newline-framed stream transport.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use rpc_agent_config::{TransportEndpoint, TransportKind};
use socket2::SockRef;
use tracing::{debug, info, warn};

use super::{
    ConnectionHandler, LISTENER_TARGET, ListenerError, ListenerHandle, resolve, spawn_for_peer,
};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Bound TCP listener awaiting [`start`](Self::start).
#[derive(Debug)]
pub struct StreamListener {
    endpoint: TransportEndpoint,
    listener: TcpListener,
}

impl StreamListener {
    /// Binds the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the address does not resolve or the
    /// port cannot be bound (for example because it is already in use).
    pub fn bind(endpoint: &TransportEndpoint) -> Result<Self, ListenerError> {
        let addr = resolve(endpoint)?;
        let listener =
            TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })?;
        Ok(Self {
            endpoint: endpoint.clone(),
            listener,
        })
    }

    /// Address actually bound, useful when the configured port is `0`.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Starts accepting connections on a background thread.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Configure`] if the socket cannot be switched
    /// to non-blocking mode, or [`ListenerError::Spawn`] if the accept thread
    /// cannot start.
    pub fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::Configure { source })?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("stream-listener".to_owned())
            .spawn(move || run_accept_loop(&self, &shutdown_flag, &handler))
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle::new(TransportKind::Stream, shutdown, handle))
    }
}

fn run_accept_loop(
    listener: &StreamListener,
    shutdown: &Arc<AtomicBool>,
    handler: &Arc<dyn ConnectionHandler>,
) {
    info!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        "stream listener active"
    );
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept_connection(&listener.listener) {
            Ok(Some((stream, peer))) => {
                last_error = None;
                debug!(target: LISTENER_TARGET, %peer, "stream connection accepted");
                let handler = Arc::clone(handler);
                let shutdown = Arc::clone(shutdown);
                spawn_for_peer(
                    thread::Builder::new().name(format!("stream-conn:{peer}")),
                    TransportKind::Stream,
                    peer,
                    move || handler.handle(stream, &shutdown),
                );
            }
            Ok(None) => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "stream accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    info!(
        target: LISTENER_TARGET,
        endpoint = %listener.endpoint,
        "stream listener stopped"
    );
}

fn accept_connection(listener: &TcpListener) -> io::Result<Option<(TcpStream, SocketAddr)>> {
    match listener.accept() {
        Ok((stream, peer)) => {
            stream.set_nonblocking(false)?;
            apply_socket_policy(&stream);
            Ok(Some((stream, peer)))
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

/// Enables `TCP_NODELAY` and keep-alive; failures are logged, not fatal.
fn apply_socket_policy(stream: &TcpStream) {
    if let Err(error) = stream.set_nodelay(true) {
        warn!(target: LISTENER_TARGET, %error, "failed to enable TCP_NODELAY");
    }
    if let Err(error) = SockRef::from(stream).set_keepalive(true) {
        warn!(target: LISTENER_TARGET, %error, "failed to enable keep-alive");
    }
}
