//! A minimal JSON-RPC 2.0 agent.
//!
//! The agent exposes a registry of `namespace.method` handlers over two
//! transports served concurrently:
//!
//! - a TCP **stream** transport (default port 9101) carrying one JSON message
//!   per `\n`-terminated line, replies written in request order;
//! - a UDP **datagram** transport (default port 9102) carrying exactly one
//!   message per datagram, replies sent back to the source address.
//!
//! Both transports feed the same [`Dispatcher`], which validates the envelope,
//! resolves the method through the [`SharedRegistry`], enforces declared
//! parameter schemas, and runs the handler against a deadline. Every request
//! yields exactly one response carrying the request's `id`.
//!
//! Extensions are registered at startup from an explicit catalogue
//! ([`BuiltinLoader`]): `echo`, `date`, `server`, `network`, and the
//! introspective `extensions` namespace.
//!
//! ## Lifecycle
//!
//! [`run_agent`] loads configuration, installs telemetry, fills the registry,
//! starts whichever transports can bind, and waits for a termination signal.
//! On shutdown it stops accepting work and gives in-flight dispatches the
//! configured grace period to finish.

mod bootstrap;
mod clock;
pub mod dispatch;
mod error;
pub mod extensions;
mod health;
mod process;
pub mod protocol;
pub mod registry;
pub mod telemetry;
pub mod transport;

pub use bootstrap::{
    Agent, BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::Dispatcher;
pub use error::{ErrorKind, ErrorSource, RpcError};
pub use extensions::{BuiltinLoader, Extension, ExtensionLoader};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, RunningTransports, ShutdownError, ShutdownSignal, SystemShutdownSignal,
    TransportStatus, run_agent, start_transports,
};
pub use registry::SharedRegistry;
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
