//! Starts the stream and datagram listeners independently.

use std::net::SocketAddr;
use std::sync::Arc;

use rpc_agent_config::TransportEndpoint;

use crate::bootstrap::Agent;
use crate::health::HealthReporter;
use crate::transport::{
    DatagramListener, FramedConnectionHandler, ListenerError, ListenerHandle, StreamListener,
};

/// Which transports came up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportStatus {
    /// Stream listener is serving.
    pub stream: bool,
    /// Datagram listener is serving.
    pub datagram: bool,
}

impl TransportStatus {
    /// Returns `true` when at least one transport is serving.
    #[must_use]
    pub const fn any(self) -> bool {
        self.stream || self.datagram
    }
}

/// Listeners started for an agent.
#[derive(Debug)]
pub struct RunningTransports {
    status: TransportStatus,
    stream_addr: Option<SocketAddr>,
    datagram_addr: Option<SocketAddr>,
    handles: Vec<ListenerHandle>,
}

impl RunningTransports {
    /// Which transports are serving.
    #[must_use]
    pub const fn status(&self) -> TransportStatus {
        self.status
    }

    /// Bound stream address, if the stream listener started.
    #[must_use]
    pub const fn stream_addr(&self) -> Option<SocketAddr> {
        self.stream_addr
    }

    /// Bound datagram address, if the datagram listener started.
    #[must_use]
    pub const fn datagram_addr(&self) -> Option<SocketAddr> {
        self.datagram_addr
    }

    /// Signals every listener to stop accepting work.
    pub fn shutdown(&self) {
        for handle in &self.handles {
            handle.shutdown();
        }
    }

    /// Stops and joins every listener.
    ///
    /// # Errors
    ///
    /// Returns the first [`ListenerError`] from a panicked listener thread.
    pub fn join(self) -> Result<(), ListenerError> {
        self.shutdown();
        let mut first_error = None;
        for handle in self.handles {
            if let Err(error) = handle.join() {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Binds and starts both listeners for `agent`.
///
/// A transport that fails is reported through the agent's reporter and left
/// out; the other still starts.
#[must_use]
pub fn start_transports(agent: &Agent) -> RunningTransports {
    let config = agent.config();
    let reporter = agent.reporter();
    let mut running = RunningTransports {
        status: TransportStatus::default(),
        stream_addr: None,
        datagram_addr: None,
        handles: Vec::with_capacity(2),
    };

    let stream_endpoint = config.stream_endpoint();
    let handler = Arc::new(FramedConnectionHandler::new(
        agent.dispatcher().clone(),
        config.max_frame_bytes(),
        config.idle_timeout(),
    ));
    let stream = StreamListener::bind(&stream_endpoint).and_then(|listener| {
        let addr = listener.local_addr();
        listener.start(handler).map(|handle| (addr, handle))
    });
    if let Some((addr, handle)) = record(reporter.as_ref(), &stream_endpoint, stream) {
        running.status.stream = true;
        running.stream_addr = addr;
        running.handles.push(handle);
    }

    let datagram_endpoint = config.datagram_endpoint();
    let dispatcher = agent.dispatcher().clone();
    let datagram = DatagramListener::bind(&datagram_endpoint).and_then(|listener| {
        let addr = listener.local_addr();
        listener.start(dispatcher).map(|handle| (addr, handle))
    });
    if let Some((addr, handle)) = record(reporter.as_ref(), &datagram_endpoint, datagram) {
        running.status.datagram = true;
        running.datagram_addr = addr;
        running.handles.push(handle);
    }

    running
}

fn record(
    reporter: &dyn HealthReporter,
    endpoint: &TransportEndpoint,
    outcome: Result<(Option<SocketAddr>, ListenerHandle), ListenerError>,
) -> Option<(Option<SocketAddr>, ListenerHandle)> {
    match outcome {
        Ok((addr, handle)) => {
            reporter.transport_started(endpoint, addr);
            Some((addr, handle))
        }
        Err(error) => {
            reporter.transport_failed(endpoint.kind, &error);
            None
        }
    }
}
