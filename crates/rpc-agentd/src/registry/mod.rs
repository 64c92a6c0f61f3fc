//! Method registry mapping `namespace.method` names to handlers.
//!
//! [`MethodRegistry`] owns every loaded [`Extension`] and lists them in
//! registration order. Explicit [`register`](MethodRegistry::register) calls
//! reject duplicate names; [`load_bulk`](MethodRegistry::load_bulk), used at
//! startup, lets the last duplicate win and logs a warning.
//!
//! Listeners reach the registry through [`SharedRegistry`], a cloneable handle
//! around a read-write lock. Resolution clones the method's `Arc` out of the
//! lock so no guard is held while a handler runs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{ErrorSource, RpcError};
use crate::extensions::{Extension, ExtensionMetadata, ExtensionStatus, Method};

pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Errors raised by registry mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An extension with the same name is already registered.
    #[error("extension '{name}' is already registered")]
    Conflict {
        /// Conflicting name.
        name: String,
    },
    /// No extension with that name exists.
    #[error("extension '{name}' is not registered")]
    NotFound {
        /// Requested name.
        name: String,
    },
    /// A writer panicked while holding the registry lock.
    #[error("registry lock poisoned")]
    Poisoned,
}

impl From<RegistryError> for RpcError {
    fn from(error: RegistryError) -> Self {
        let message = error.to_string();
        match error {
            RegistryError::Conflict { .. } => Self::server(message),
            RegistryError::NotFound { name } => Self::extension_not_found(&name),
            RegistryError::Poisoned => Self::service_unavailable(message),
        }
        .with_origin(ErrorSource::Registry)
    }
}

/// Introspection view of one extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionSummary {
    /// Namespace name.
    pub name: String,
    /// Current status.
    pub status: ExtensionStatus,
    /// Whether the extension accepts calls when active.
    pub enabled: bool,
    /// Descriptive metadata.
    pub metadata: ExtensionMetadata,
    /// Unqualified method names.
    pub methods: Vec<String>,
}

impl From<&Extension> for ExtensionSummary {
    fn from(extension: &Extension) -> Self {
        Self {
            name: extension.name().to_owned(),
            status: extension.status(),
            enabled: extension.config().enabled,
            metadata: extension.metadata().clone(),
            methods: extension.method_names(),
        }
    }
}

/// Ordered collection of extensions.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    order: Vec<String>,
    extensions: HashMap<String, Extension>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `extension`, refusing to replace an existing one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Conflict`] when the name is taken; the
    /// registered extension is left untouched.
    pub fn register(&mut self, extension: Extension) -> Result<(), RegistryError> {
        let name = extension.name().to_owned();
        if self.extensions.contains_key(&name) {
            return Err(RegistryError::Conflict { name });
        }
        debug!(target: REGISTRY_TARGET, extension = %name, "extension registered");
        self.order.push(name.clone());
        self.extensions.insert(name, extension);
        Ok(())
    }

    /// Adds every extension, letting the last of any duplicates win.
    ///
    /// A replaced extension keeps its original listing position. Returns the
    /// name of each replacement, once per collision, in load order.
    pub fn load_bulk(&mut self, extensions: impl IntoIterator<Item = Extension>) -> Vec<String> {
        let mut replaced = Vec::new();
        for extension in extensions {
            let name = extension.name().to_owned();
            if self.extensions.contains_key(&name) {
                warn!(
                    target: REGISTRY_TARGET,
                    extension = %name,
                    "duplicate extension name during bulk load; keeping the later one"
                );
                replaced.push(name.clone());
            } else {
                self.order.push(name.clone());
            }
            self.extensions.insert(name, extension);
        }
        replaced
    }

    /// Resolves a fully qualified `namespace.method` name.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` when the name has no `.` separator.
    /// - `ExtensionNotFound` when the namespace is unknown.
    /// - `ExtensionDisabled` when the namespace is inactive or disabled.
    /// - `MethodNotFound` when the namespace lacks the method.
    pub fn resolve(&self, full_name: &str) -> Result<Arc<Method>, RpcError> {
        let Some((namespace, method)) = full_name.split_once('.') else {
            return Err(RpcError::invalid_request(format!(
                "Invalid method format '{full_name}'; expected 'namespace.method'"
            ))
            .with_detail("method", full_name));
        };
        let extension = self
            .extensions
            .get(namespace)
            .ok_or_else(|| RpcError::extension_not_found(namespace))?;
        if !extension.is_callable() {
            return Err(RpcError::extension_disabled(namespace)
                .with_detail("status", extension.status().as_str()));
        }
        extension
            .method(method)
            .ok_or_else(|| RpcError::method_not_found(full_name))
    }

    /// Summaries of every extension in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<ExtensionSummary> {
        self.order
            .iter()
            .filter_map(|name| self.extensions.get(name))
            .map(ExtensionSummary::from)
            .collect()
    }

    /// Looks up an extension by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Extension> {
        self.extensions.get(name)
    }

    /// Changes the status of a registered extension.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown name.
    pub fn set_status(&mut self, name: &str, status: ExtensionStatus) -> Result<(), RegistryError> {
        let extension = self
            .extensions
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_owned(),
            })?;
        extension.set_status(status);
        Ok(())
    }

    /// Number of registered extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// Cloneable, lock-guarded handle to a [`MethodRegistry`].
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<MethodRegistry>>,
}

impl SharedRegistry {
    /// Wraps an existing registry.
    #[must_use]
    pub fn new(registry: MethodRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MethodRegistry>, RegistryError> {
        self.inner.read().map_err(|_| RegistryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MethodRegistry>, RegistryError> {
        self.inner.write().map_err(|_| RegistryError::Poisoned)
    }

    /// See [`MethodRegistry::register`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Conflict`] for a duplicate name and
    /// [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn register(&self, extension: Extension) -> Result<(), RegistryError> {
        self.write()?.register(extension)
    }

    /// See [`MethodRegistry::load_bulk`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn load_bulk(
        &self,
        extensions: impl IntoIterator<Item = Extension>,
    ) -> Result<Vec<String>, RegistryError> {
        Ok(self.write()?.load_bulk(extensions))
    }

    /// See [`MethodRegistry::resolve`].
    ///
    /// # Errors
    ///
    /// As [`MethodRegistry::resolve`], plus `ServiceUnavailable` when the lock
    /// is poisoned.
    pub fn resolve(&self, full_name: &str) -> Result<Arc<Method>, RpcError> {
        self.read()?.resolve(full_name)
    }

    /// See [`MethodRegistry::list`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn list(&self) -> Result<Vec<ExtensionSummary>, RegistryError> {
        Ok(self.read()?.list())
    }

    /// Summary of a single extension.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn get(&self, name: &str) -> Result<Option<ExtensionSummary>, RegistryError> {
        Ok(self.read()?.get(name).map(ExtensionSummary::from))
    }

    /// See [`MethodRegistry::set_status`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown name and
    /// [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn set_status(&self, name: &str, status: ExtensionStatus) -> Result<(), RegistryError> {
        self.write()?.set_status(name, status)
    }

    /// Number of registered extensions.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.read()?.len())
    }

    /// Returns `true` when nothing is registered.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.read()?.is_empty())
    }
}
