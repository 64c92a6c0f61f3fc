//! Startup registration of extensions.
//!
//! An [`ExtensionLoader`] produces candidate extensions; [`install`] validates
//! them, skips anything malformed with a warning, and bulk-loads the rest into
//! the registry. An agent with zero extensions still starts.

use thiserror::Error;
use tracing::{info, warn};

use crate::health::HealthReporter;
use crate::registry::{RegistryError, SharedRegistry};

use super::contract::Extension;

pub(crate) const LOADER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::extensions");

/// Reasons an extension is skipped during loading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtensionLoadError {
    /// Extension name was blank.
    #[error("extension name is empty")]
    EmptyName,
    /// Extension name contains the namespace separator.
    #[error("extension name '{name}' must not contain '.'")]
    DottedName {
        /// Offending name.
        name: String,
    },
    /// Extension exposes nothing callable.
    #[error("extension '{name}' declares no methods")]
    NoMethods {
        /// Offending name.
        name: String,
    },
    /// Loader could not construct the extension.
    #[error("failed to load extension '{name}': {message}")]
    Failed {
        /// Name of the extension that failed.
        name: String,
        /// Loader-specific reason.
        message: String,
    },
}

impl ExtensionLoadError {
    /// Creates a construction failure.
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Source of extensions registered at startup.
pub trait ExtensionLoader: Send + Sync {
    /// Produces candidate extensions.
    ///
    /// `registry` is the registry the extensions will be installed into, for
    /// extensions that introspect it.
    fn load(&self, registry: &SharedRegistry) -> Vec<Result<Extension, ExtensionLoadError>>;
}

/// Counts reported after [`install`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Names of the extensions handed to the registry, in load order.
    pub loaded: Vec<String>,
    /// Number of candidates skipped.
    pub skipped: usize,
    /// Names whose earlier extension was replaced by a later duplicate.
    pub replaced: Vec<String>,
}

/// Loads extensions from `loader` into `registry`.
///
/// Malformed or failing candidates are skipped with a warning. Name
/// collisions are resolved by [`SharedRegistry::load_bulk`].
///
/// # Errors
///
/// Returns [`RegistryError::Poisoned`] when the registry lock is poisoned.
pub fn install(
    loader: &dyn ExtensionLoader,
    registry: &SharedRegistry,
    reporter: &dyn HealthReporter,
) -> Result<LoadReport, RegistryError> {
    let mut report = LoadReport::default();
    let mut accepted = Vec::new();

    for candidate in loader.load(registry) {
        match candidate.and_then(|extension| extension.validate().map(|()| extension)) {
            Ok(extension) => {
                report.loaded.push(extension.name().to_owned());
                accepted.push(extension);
            }
            Err(error) => {
                warn!(target: LOADER_TARGET, %error, "skipping extension");
                reporter.extension_skipped(&error);
                report.skipped += 1;
            }
        }
    }

    report.replaced = registry.load_bulk(accepted)?;
    for name in &report.loaded {
        reporter.extension_loaded(name);
    }
    for name in &report.replaced {
        reporter.extension_replaced(name);
    }
    info!(
        target: LOADER_TARGET,
        loaded = report.loaded.len(),
        skipped = report.skipped,
        replaced = report.replaced.len(),
        "extensions installed"
    );
    Ok(report)
}
