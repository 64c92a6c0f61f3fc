//! Built-in namespaces shipped with the agent.
//!
//! | Method | Result |
//! |---|---|
//! | `echo.echo(message)` | `{message, timestamp}` |
//! | `date.now()` | `{timestamp, unix, utc, local, timezone}` |
//! | `server.system()` | `{hostname, platform, arch, cpus, memory, uptime, loadavg}` |
//! | `network.validatePort(port, type)` | `{valid, port, type}` |
//! | `extensions.list()` | `{extensions, total}` |
//! | `extensions.get(name)` | extension summary |

mod date;
mod echo;
mod introspection;
mod network;
mod system;

use crate::registry::SharedRegistry;

use super::contract::Extension;
use super::loader::{ExtensionLoadError, ExtensionLoader};

/// Loader for the fixed built-in catalogue.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinLoader;

impl ExtensionLoader for BuiltinLoader {
    fn load(&self, registry: &SharedRegistry) -> Vec<Result<Extension, ExtensionLoadError>> {
        catalogue(registry).into_iter().map(Ok).collect()
    }
}

/// Built-in extensions in registration order.
#[must_use]
pub fn catalogue(registry: &SharedRegistry) -> Vec<Extension> {
    vec![
        echo::extension(),
        date::extension(),
        system::extension(),
        network::extension(),
        introspection::extension(registry),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_well_formed() {
        let registry = SharedRegistry::default();
        let extensions = catalogue(&registry);
        let names: Vec<&str> = extensions.iter().map(Extension::name).collect();

        assert_eq!(names, ["echo", "date", "server", "network", "extensions"]);
        for extension in &extensions {
            extension.validate().expect("built-in extension is valid");
        }
    }
}
