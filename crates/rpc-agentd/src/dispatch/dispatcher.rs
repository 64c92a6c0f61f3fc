//! Request dispatcher tying validation, resolution and execution together.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ErrorKind, RpcError};
use crate::extensions::Params;
use crate::protocol::{self, Incoming, Outgoing, Request, Response};
use crate::registry::SharedRegistry;

use super::executor::execute;
use super::in_flight::InFlight;
use super::validate::validate;
use super::DISPATCH_TARGET;

/// Pure `(request, registry) -> response` core shared by both transports.
///
/// The dispatcher never touches sockets. Every call produces exactly one
/// response, or one array of responses for a batch.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: SharedRegistry,
    call_timeout: Duration,
    in_flight: InFlight,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry` with a per-call deadline.
    #[must_use]
    pub fn new(registry: SharedRegistry, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
            in_flight: InFlight::new(),
        }
    }

    /// Per-call deadline.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Counter of dispatches still running.
    #[must_use]
    pub const fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Decodes `bytes` and dispatches the message.
    ///
    /// Undecodable input yields a single error response with `id: null`.
    pub fn dispatch_bytes(&self, bytes: &[u8]) -> Outgoing {
        let _guard = self.in_flight.enter();
        match protocol::decode(bytes) {
            Ok(incoming) => self.dispatch(incoming),
            Err(error) => {
                debug!(
                    target: DISPATCH_TARGET,
                    code = error.code(),
                    error_id = %error.error_id(),
                    "rejected undecodable message"
                );
                Outgoing::Single(Response::failure(&error))
            }
        }
    }

    /// Dispatches a decoded message; batch members run sequentially.
    pub fn dispatch(&self, incoming: Incoming) -> Outgoing {
        match incoming {
            Incoming::Single(value) => Outgoing::Single(self.dispatch_value(value)),
            Incoming::Batch(values) => Outgoing::Batch(
                values
                    .into_iter()
                    .map(|value| self.dispatch_value(value))
                    .collect(),
            ),
        }
    }

    /// Dispatches one candidate request object.
    pub fn dispatch_value(&self, value: Value) -> Response {
        let started = Instant::now();
        let request = match validate(value) {
            Ok(request) => request,
            Err(error) => {
                log_failure("<invalid>", &error, started);
                return Response::failure(&error);
            }
        };

        match self.invoke(&request) {
            Ok(result) => {
                debug!(
                    target: DISPATCH_TARGET,
                    method = %request.method,
                    id = %request.id,
                    outcome = "completed",
                    elapsed_ms = elapsed_ms(started),
                    "dispatched request"
                );
                Response::success(request.id, result)
            }
            Err(error) => {
                let error = error.with_request_id(request.id);
                log_failure(&request.method, &error, started);
                Response::failure(&error)
            }
        }
    }

    fn invoke(&self, request: &Request) -> Result<Value, RpcError> {
        let method = self.registry.resolve(&request.method)?;
        let params = Params::new(request.params.clone().unwrap_or_default());
        if let Some(schema) = method.schema() {
            schema.check(&params)?;
        }
        execute(&method, params, &request.method, self.call_timeout)
    }
}

fn log_failure(method: &str, error: &RpcError, started: Instant) {
    let outcome = match error.kind() {
        ErrorKind::Timeout => "timed_out",
        _ => "failed",
    };
    debug!(
        target: DISPATCH_TARGET,
        method,
        id = %error.request_id(),
        outcome,
        code = error.code(),
        error_id = %error.error_id(),
        elapsed_ms = elapsed_ms(started),
        "dispatched request"
    );
    if matches!(error.kind(), ErrorKind::Timeout | ErrorKind::InternalError) {
        warn!(
            target: DISPATCH_TARGET,
            method,
            error_id = %error.error_id(),
            error = %error,
            "handler did not complete"
        );
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
