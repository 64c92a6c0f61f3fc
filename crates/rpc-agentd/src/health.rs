//! Lifecycle observers.
//!
//! Bootstrap, extension loading, and listener startup report through a
//! [`HealthReporter`] so tests can record events and production logs them.

use std::net::SocketAddr;
use std::sync::Arc;

use rpc_agent_config::{Config, TransportEndpoint, TransportKind};

use crate::bootstrap::BootstrapError;
use crate::extensions::ExtensionLoadError;
use crate::transport::ListenerError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked for each extension handed to the registry.
    fn extension_loaded(&self, name: &str);

    /// Invoked for each extension rejected during loading.
    fn extension_skipped(&self, error: &ExtensionLoadError);

    /// Records that a later extension replaced an earlier one of the same name.
    fn extension_replaced(&self, name: &str);

    /// Invoked once a listener is bound and serving. `local_addr` is the
    /// address actually bound, which differs from the endpoint for port `0`.
    fn transport_started(&self, endpoint: &TransportEndpoint, local_addr: Option<SocketAddr>);

    /// Invoked when a listener cannot be bound or started.
    fn transport_failed(&self, kind: TransportKind, error: &ListenerError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn extension_loaded(&self, name: &str) {
        (**self).extension_loaded(name);
    }

    fn extension_skipped(&self, error: &ExtensionLoadError) {
        (**self).extension_skipped(error);
    }

    fn extension_replaced(&self, name: &str) {
        (**self).extension_replaced(name);
    }

    fn transport_started(&self, endpoint: &TransportEndpoint, local_addr: Option<SocketAddr>) {
        (**self).transport_started(endpoint, local_addr);
    }

    fn transport_failed(&self, kind: TransportKind, error: &ListenerError) {
        (**self).transport_failed(kind, error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting agent bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            stream = %config.stream_endpoint(),
            datagram = %config.datagram_endpoint(),
            call_timeout_ms = config.call_timeout_ms,
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "agent bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "agent bootstrap failed"
        );
    }

    fn extension_loaded(&self, name: &str) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "extension_loaded",
            extension = name,
            "extension loaded"
        );
    }

    fn extension_skipped(&self, error: &ExtensionLoadError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "extension_skipped",
            error = %error,
            "extension skipped"
        );
    }

    fn extension_replaced(&self, name: &str) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "extension_replaced",
            extension = name,
            "duplicate extension replaced an earlier one"
        );
    }

    fn transport_started(&self, endpoint: &TransportEndpoint, local_addr: Option<SocketAddr>) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "transport_started",
            transport = %endpoint.kind,
            endpoint = %endpoint,
            local_addr = ?local_addr,
            "listener ready"
        );
    }

    fn transport_failed(&self, kind: TransportKind, error: &ListenerError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "transport_failed",
            transport = %kind,
            error = %error,
            "listener failed to start"
        );
    }
}
