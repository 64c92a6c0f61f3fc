//! JSON-RPC dispatch core.
//!
//! Every message follows the same path regardless of transport:
//!
//! ```text
//! RECEIVED -> VALIDATED -> RESOLVED -> EXECUTING -> COMPLETED | FAILED | TIMED_OUT
//! ```
//!
//! Validation checks the envelope, resolution goes through the
//! [`SharedRegistry`](crate::registry::SharedRegistry), declared param schemas
//! are enforced, and the handler runs on a worker thread raced against the
//! configured deadline. Each terminal state yields exactly one response.

mod dispatcher;
mod executor;
mod in_flight;
mod validate;

pub use self::dispatcher::Dispatcher;
pub use self::in_flight::{InFlight, InFlightGuard};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
