//! Handler execution under a deadline: `EXECUTING -> COMPLETED | FAILED | TIMED_OUT`.
//!
//! Each call runs on its own worker thread and the dispatcher waits on a
//! channel with a timeout. A handler that misses the deadline is abandoned,
//! not cancelled: it keeps running and its result is dropped when it arrives.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::RpcError;
use crate::extensions::{Method, Params};

use super::DISPATCH_TARGET;

type Outcome = thread::Result<Result<Value, RpcError>>;

/// Runs `method` with `params`, waiting at most `deadline` for the result.
///
/// # Errors
///
/// - The handler's own error, unchanged.
/// - `InternalError` when the handler panics or its thread cannot start.
/// - `Timeout` when the deadline elapses first.
pub(crate) fn execute(
    method: &Method,
    params: Params,
    full_name: &str,
    deadline: Duration,
) -> Result<Value, RpcError> {
    let handler = method.handler();
    let (sender, receiver) = mpsc::sync_channel::<Outcome>(1);
    let abandoned_name = full_name.to_owned();

    thread::Builder::new()
        .name(format!("rpc-call:{full_name}"))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&params)));
            if sender.send(outcome).is_err() {
                debug!(
                    target: DISPATCH_TARGET,
                    method = %abandoned_name,
                    "discarding result of abandoned handler"
                );
            }
        })
        .map_err(|error| RpcError::internal(format!("failed to start handler thread: {error}")))?;

    match receiver.recv_timeout(deadline) {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => Err(RpcError::internal(format!(
            "Handler for '{full_name}' panicked: {}",
            panic_message(payload.as_ref())
        ))),
        Err(RecvTimeoutError::Timeout) => Err(RpcError::timeout(full_name, deadline)),
        Err(RecvTimeoutError::Disconnected) => Err(RpcError::internal(format!(
            "Handler for '{full_name}' exited without a result"
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
