//! Per-connection read/dispatch/write loop for the stream transport.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::error::RpcError;
use crate::protocol::{FrameBuffer, FrameEvent, Outgoing, Response};

use super::LISTENER_TARGET;

/// Upper bound on how long a blocked read waits before rechecking shutdown
/// and idle state.
const READ_POLL: Duration = Duration::from_millis(250);
const CHUNK_BYTES: usize = 8 * 1024;

/// Handles accepted stream connections.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Serves one connection until it closes or `shutdown` is set.
    /// Implementations should avoid panicking.
    fn handle(&self, stream: TcpStream, shutdown: &AtomicBool);
}

/// Connection handler speaking newline-delimited JSON-RPC.
///
/// Frames are processed strictly in arrival order: each response is written
/// before the next frame is dispatched.
#[derive(Debug, Clone)]
pub struct FramedConnectionHandler {
    dispatcher: Dispatcher,
    max_frame_bytes: usize,
    idle_timeout: Duration,
}

impl FramedConnectionHandler {
    /// Creates a handler with the given buffer cap and idle timeout.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher, max_frame_bytes: usize, idle_timeout: Duration) -> Self {
        Self {
            dispatcher,
            max_frame_bytes,
            idle_timeout,
        }
    }

    fn serve(&self, stream: &mut TcpStream, shutdown: &AtomicBool) -> io::Result<()> {
        let poll = READ_POLL.min(self.idle_timeout).max(Duration::from_millis(1));
        stream.set_read_timeout(Some(poll))?;

        let mut frames = FrameBuffer::new(self.max_frame_bytes);
        let mut chunk = vec![0_u8; CHUNK_BYTES];
        let mut last_activity = Instant::now();

        while !shutdown.load(Ordering::SeqCst) {
            let bytes_read = match stream.read(&mut chunk) {
                Ok(0) => {
                    debug!(target: LISTENER_TARGET, "peer closed connection");
                    return Ok(());
                }
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    if last_activity.elapsed() >= self.idle_timeout {
                        debug!(target: LISTENER_TARGET, "closing idle connection");
                        return Ok(());
                    }
                    continue;
                }
                Err(error) => return Err(error),
            };
            last_activity = Instant::now();

            for event in frames.push(chunk.get(..bytes_read).unwrap_or_default()) {
                let reply = self.reply_to(event);
                stream.write_all(&reply.encode())?;
            }
            stream.flush()?;
        }
        debug!(target: LISTENER_TARGET, "closing connection for shutdown");
        Ok(())
    }

    fn reply_to(&self, event: FrameEvent) -> Outgoing {
        match event {
            FrameEvent::Frame(bytes) => self.dispatcher.dispatch_bytes(&bytes),
            FrameEvent::Overflow => {
                let error = RpcError::buffer_overflow(self.max_frame_bytes);
                warn!(
                    target: LISTENER_TARGET,
                    limit = self.max_frame_bytes,
                    error_id = %error.error_id(),
                    "stream frame exceeded buffer limit"
                );
                Outgoing::Single(Response::failure(&error))
            }
        }
    }
}

impl ConnectionHandler for FramedConnectionHandler {
    fn handle(&self, mut stream: TcpStream, shutdown: &AtomicBool) {
        if let Err(error) = self.serve(&mut stream, shutdown) {
            if matches!(
                error.kind(),
                io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe
            ) {
                debug!(target: LISTENER_TARGET, %error, "peer dropped connection");
            } else {
                warn!(target: LISTENER_TARGET, %error, "connection handler error");
            }
        }
    }
}
