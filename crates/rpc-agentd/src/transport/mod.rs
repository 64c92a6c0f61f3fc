//! Stream (TCP) and datagram (UDP) listeners.
//!
//! Both listeners bind a configured [`TransportEndpoint`], run on background
//! threads, and hand raw bytes to a shared [`Dispatcher`](crate::dispatch::Dispatcher).
//! Neither touches the registry directly. Bind failures are returned to the
//! caller and never retried.

mod connection;
mod datagram;
mod errors;
mod handle;
mod stream;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

use std::net::{SocketAddr, ToSocketAddrs};
use std::thread;

use rpc_agent_config::{TransportEndpoint, TransportKind};
use tracing::warn;

pub use self::connection::{ConnectionHandler, FramedConnectionHandler};
pub use self::datagram::{DatagramListener, MAX_DATAGRAM_BYTES};
pub use self::errors::ListenerError;
pub use self::handle::ListenerHandle;
pub use self::stream::StreamListener;
#[cfg(test)]
pub(crate) use self::test_utils::{StreamClient, datagram_exchange, test_dispatcher};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

fn resolve(endpoint: &TransportEndpoint) -> Result<SocketAddr, ListenerError> {
    let host = endpoint.host.as_str();
    let port = endpoint.port;
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    addrs.next().ok_or_else(|| ListenerError::ResolveEmpty {
        host: host.to_owned(),
        port,
    })
}

/// Runs `work` on a new thread for one peer.
///
/// When the OS refuses the thread, the work is dropped with a warning and
/// `false` is returned so the calling loop keeps serving.
fn spawn_for_peer<F>(
    builder: thread::Builder,
    kind: TransportKind,
    peer: SocketAddr,
    work: F,
) -> bool
where
    F: FnOnce() + Send + 'static,
{
    match builder.spawn(work) {
        Ok(_) => true,
        Err(error) => {
            warn!(
                target: LISTENER_TARGET,
                transport = %kind,
                %peer,
                %error,
                "failed to start worker thread; dropping peer"
            );
            false
        }
    }
}
