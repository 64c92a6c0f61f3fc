//! Extension loader double: the built-in catalogue plus scenario extras.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use serde_json::json;

use crate::extensions::{Extension, ExtensionLoadError, ExtensionLoader, catalogue};
use crate::registry::SharedRegistry;

/// Catalogue wrapper that can add malformed candidates and a blocking method.
#[derive(Debug, Clone, Default)]
pub struct TestExtensions {
    malformed: bool,
    duplicate: bool,
    blocking: Option<Duration>,
    entered: Arc<AtomicBool>,
}

impl TestExtensions {
    /// Adds a dotted name, an empty extension, and a failed load.
    #[must_use]
    pub fn with_malformed(mut self) -> Self {
        self.malformed = true;
        self
    }

    /// Adds a second `echo` extension, version `2.0.0`, after the catalogue.
    #[must_use]
    pub fn with_duplicate(mut self) -> Self {
        self.duplicate = true;
        self
    }

    /// Adds `test.block`, which sleeps for `duration` once entered.
    #[must_use]
    pub fn with_blocking(mut self, duration: Duration) -> Self {
        self.blocking = Some(duration);
        self
    }

    /// Whether `test.block` has started running.
    #[must_use]
    pub fn block_entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }
}

impl ExtensionLoader for TestExtensions {
    fn load(&self, registry: &SharedRegistry) -> Vec<Result<Extension, ExtensionLoadError>> {
        let mut candidates: Vec<_> = catalogue(registry).into_iter().map(Ok).collect();
        if self.malformed {
            candidates.push(Ok(Extension::builder("bad.name")
                .handler("noop", |_| Ok(json!(null)))
                .build()));
            candidates.push(Ok(Extension::builder("hollow").build()));
            candidates.push(Err(ExtensionLoadError::failed("broken", "module missing")));
        }
        if self.duplicate {
            candidates.push(Ok(Extension::builder("echo")
                .version("2.0.0")
                .handler("echo", |_| Ok(json!("replacement")))
                .build()));
        }
        if let Some(duration) = self.blocking {
            let entered = Arc::clone(&self.entered);
            candidates.push(Ok(Extension::builder("test")
                .handler("block", move |_| {
                    entered.store(true, Ordering::SeqCst);
                    thread::sleep(duration);
                    Ok(json!("unblocked"))
                })
                .build()));
        }
        candidates
    }
}
