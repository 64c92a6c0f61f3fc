//! Supervises agent launch sequencing and shutdown.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::extensions::{BuiltinLoader, ExtensionLoader};
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::transports::start_transports;
use super::PROCESS_TARGET;

/// Service dependencies required to construct the agent.
pub(crate) struct ServiceDeps<L, E> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) extensions: E,
}

/// Collaborators required to launch the agent.
pub(crate) struct LaunchPlan<L, E, S> {
    pub(crate) services: ServiceDeps<L, E>,
    pub(crate) shutdown: S,
}

/// Runs the agent using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap fails, when neither transport
/// starts, or when dispatches outlive the shutdown grace period.
pub fn run_agent() -> Result<(), LaunchError> {
    run_agent_with(LaunchPlan {
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
            extensions: BuiltinLoader,
        },
        shutdown: SystemShutdownSignal::new(),
    })
}

/// Runs the agent with injected collaborators.
pub(crate) fn run_agent_with<L, E, S>(plan: LaunchPlan<L, E, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    E: ExtensionLoader,
    S: ShutdownSignal,
{
    let LaunchPlan { services, shutdown } = plan;
    let ServiceDeps {
        loader,
        reporter,
        extensions,
    } = services;

    info!(target: PROCESS_TARGET, "starting agent runtime");
    let agent = bootstrap_with(&loader, reporter, &extensions)?;
    let transports = start_transports(&agent);
    let status = transports.status();
    if !status.any() {
        return Err(LaunchError::NoTransports);
    }
    info!(
        target: PROCESS_TARGET,
        stream = status.stream,
        datagram = status.datagram,
        "agent ready"
    );

    shutdown.wait()?;

    transports.shutdown();
    let grace = agent.config().shutdown_grace();
    let in_flight = agent.dispatcher().in_flight();
    let drained = in_flight.wait_idle(grace);
    transports.join()?;
    if !drained {
        let remaining = in_flight.current();
        warn!(
            target: PROCESS_TARGET,
            in_flight = remaining,
            grace_ms = grace.as_millis(),
            "shutdown grace period expired"
        );
        return Err(LaunchError::GraceExpired {
            in_flight: remaining,
        });
    }
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
