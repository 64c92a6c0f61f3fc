//! Extension contract, startup loader and built-in namespaces.
//!
//! An extension is a named group of methods registered once at startup. The
//! agent ships a fixed [`BuiltinLoader`] catalogue; other loaders implement
//! [`ExtensionLoader`] and are handed to bootstrap explicitly, so the set of
//! reachable methods is always decided by code rather than by scanning the
//! filesystem.

mod builtin;
mod contract;
mod loader;

pub use self::builtin::{BuiltinLoader, catalogue};
pub use self::contract::{
    Extension, ExtensionBuilder, ExtensionConfig, ExtensionMetadata, ExtensionStatus, Handler,
    HandlerFn, Method, ParamSchema, ParamType, Params, json_type_name,
};
pub use self::loader::{ExtensionLoadError, ExtensionLoader, LoadReport, install};
