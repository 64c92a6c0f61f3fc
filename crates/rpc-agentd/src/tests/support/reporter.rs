//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::net::SocketAddr;
use std::sync::Mutex;

use rpc_agent_config::{Config, TransportEndpoint, TransportKind};

use crate::bootstrap::BootstrapError;
use crate::extensions::ExtensionLoadError;
use crate::health::HealthReporter;
use crate::transport::ListenerError;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ExtensionLoaded(String),
    ExtensionSkipped(String),
    ExtensionReplaced(String),
    TransportStarted {
        kind: TransportKind,
        addr: Option<SocketAddr>,
    },
    TransportFailed(TransportKind),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Bound address reported for `kind`, if that transport started.
    #[must_use]
    pub fn started_addr(&self, kind: TransportKind) -> Option<SocketAddr> {
        self.events().into_iter().find_map(|event| match event {
            HealthEvent::TransportStarted {
                kind: started,
                addr,
            } if started == kind => addr,
            _ => None,
        })
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn extension_loaded(&self, name: &str) {
        self.record(HealthEvent::ExtensionLoaded(name.to_owned()));
    }

    fn extension_skipped(&self, error: &ExtensionLoadError) {
        self.record(HealthEvent::ExtensionSkipped(error.to_string()));
    }

    fn extension_replaced(&self, name: &str) {
        self.record(HealthEvent::ExtensionReplaced(name.to_owned()));
    }

    fn transport_started(&self, endpoint: &TransportEndpoint, local_addr: Option<SocketAddr>) {
        self.record(HealthEvent::TransportStarted {
            kind: endpoint.kind,
            addr: local_addr,
        });
    }

    fn transport_failed(&self, kind: TransportKind, _error: &ListenerError) {
        self.record(HealthEvent::TransportFailed(kind));
    }
}
