//! Agent bootstrap orchestration.
//!
//! Bootstrap loads configuration, installs telemetry, and fills the registry
//! from an [`ExtensionLoader`]. Listeners are started separately by the
//! process layer so that each transport can fail on its own.

use std::sync::Arc;

use ortho_config::OrthoError;
use thiserror::Error;

use rpc_agent_config::Config;

use crate::dispatch::Dispatcher;
use crate::extensions::{ExtensionLoader, LoadReport, install};
use crate::health::HealthReporter;
use crate::registry::{RegistryError, SharedRegistry};
use crate::telemetry::{self, TelemetryError};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the agent configuration.
    ///
    /// # Errors
    ///
    /// Returns the layered loader's error when a source is malformed.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Extensions could not be installed.
    #[error("failed to install extensions: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
}

/// A bootstrapped agent, ready to start its listeners.
pub struct Agent {
    config: Config,
    registry: SharedRegistry,
    dispatcher: Dispatcher,
    extensions: LoadReport,
    reporter: Arc<dyn HealthReporter>,
}

impl Agent {
    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Registry shared with the dispatcher.
    #[must_use]
    pub const fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Dispatcher both listeners feed.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Outcome of extension loading.
    #[must_use]
    pub const fn extensions(&self) -> &LoadReport {
        &self.extensions
    }

    /// Reporter used during bootstrap, for later lifecycle events.
    #[must_use]
    pub fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Agent")
            .field("config", &self.config)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the agent using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry, or registry
/// installation fails. The reporter is told about the failure first.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    extensions: &dyn ExtensionLoader,
) -> Result<Agent, BootstrapError> {
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;
    telemetry::initialise(&config).map_err(|source| fail(BootstrapError::Telemetry { source }))?;

    let registry = SharedRegistry::default();
    let report = install(extensions, &registry, reporter.as_ref())
        .map_err(|source| fail(BootstrapError::Registry { source }))?;
    let dispatcher = Dispatcher::new(registry.clone(), config.call_timeout());

    reporter.bootstrap_succeeded(&config);
    Ok(Agent {
        config,
        registry,
        dispatcher,
        extensions: report,
        reporter,
    })
}
