//! Process lifecycle: bootstrap, start both transports, wait for a
//! termination signal, then drain in-flight dispatches.

mod errors;
pub(crate) mod launch;
pub(crate) mod shutdown;
mod transports;

pub use errors::LaunchError;
pub use launch::run_agent;
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use transports::{RunningTransports, TransportStatus, start_transports};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
