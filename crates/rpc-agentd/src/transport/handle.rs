//! Handle to a running listener thread.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;

use rpc_agent_config::TransportKind;

use super::ListenerError;

/// Handle to the background thread of a stream or datagram listener.
///
/// Dropping the handle requests shutdown without waiting for the thread.
#[derive(Debug)]
pub struct ListenerHandle {
    kind: TransportKind,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(super) const fn new(
        kind: TransportKind,
        shutdown: Arc<AtomicBool>,
        handle: thread::JoinHandle<()>,
    ) -> Self {
        Self {
            kind,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Transport served by the listener.
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Asks the listener and its connections to stop.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the listener thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the thread panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => Ok(()),
                Err(_) => Err(ListenerError::ThreadPanic),
            }
        } else {
            Ok(())
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}
