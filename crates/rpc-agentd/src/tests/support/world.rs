//! Bootstrap scenario world: loader, extension source, reporter, outcome.

use std::cell::RefCell;
use std::sync::Arc;

use crate::bootstrap::{Agent, BootstrapError, ConfigLoader, bootstrap_with};

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::extensions::TestExtensions;
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across bootstrap steps.
pub struct BootstrapWorld {
    loader: Box<dyn ConfigLoader>,
    pub extensions: TestExtensions,
    pub reporter: Arc<RecordingHealthReporter>,
    agent: Option<Agent>,
    bootstrap_error: Option<BootstrapError>,
}

impl BootstrapWorld {
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: Box::new(TestConfigLoader::new()),
            extensions: TestExtensions::default(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            agent: None,
            bootstrap_error: None,
        }
    }

    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
    }

    pub fn add_malformed_extensions(&mut self) {
        self.extensions = self.extensions.clone().with_malformed();
    }

    pub fn add_duplicate_extension(&mut self) {
        self.extensions = self.extensions.clone().with_duplicate();
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.agent.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.clone(), &self.extensions) {
            Ok(agent) => self.agent = Some(agent),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    #[must_use]
    pub fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }
}

impl Default for BootstrapWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default world fixture.
#[must_use]
pub fn world() -> RefCell<BootstrapWorld> {
    RefCell::new(BootstrapWorld::new())
}
