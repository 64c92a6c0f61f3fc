//! Shared doubles for the behavioural suites.

mod config_loader;
mod extensions;
mod reporter;
mod shutdown;
mod world;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use extensions::TestExtensions;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use shutdown::ManualShutdown;
pub use world::{BootstrapWorld, world};
