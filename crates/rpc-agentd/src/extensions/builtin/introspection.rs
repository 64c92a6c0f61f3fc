//! `extensions` namespace: lists what the registry holds.

use serde_json::{Value, json};

use crate::error::RpcError;
use crate::extensions::{Extension, Method, ParamSchema, ParamType, Params};
use crate::registry::SharedRegistry;

pub(super) fn extension(registry: &SharedRegistry) -> Extension {
    let list_registry = registry.clone();
    let get_registry = registry.clone();
    Extension::builder("extensions")
        .version("1.0.0")
        .description("Introspection of loaded extensions")
        .handler("list", move |_params: &Params| list(&list_registry))
        .method(
            Method::new("get", move |params: &Params| get(&get_registry, params))
                .with_schema(ParamSchema::new().require("name", ParamType::String)),
        )
        .build()
}

fn list(registry: &SharedRegistry) -> Result<Value, RpcError> {
    let extensions = registry.list()?;
    let total = extensions.len();
    Ok(json!({
        "extensions": extensions,
        "total": total,
    }))
}

fn get(registry: &SharedRegistry, params: &Params) -> Result<Value, RpcError> {
    let name = params.require_str("name")?;
    let summary = registry
        .get(name)?
        .ok_or_else(|| RpcError::extension_not_found(name))?;
    serde_json::to_value(summary).map_err(|error| RpcError::internal(error.to_string()))
}
