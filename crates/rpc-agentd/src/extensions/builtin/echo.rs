//! `echo` namespace.

use serde_json::{Value, json};

use crate::clock;
use crate::error::RpcError;
use crate::extensions::{Extension, Method, ParamSchema, ParamType, Params};

pub(super) fn extension() -> Extension {
    Extension::builder("echo")
        .version("1.0.0")
        .description("Returns the supplied message")
        .method(
            Method::new("echo", echo)
                .with_schema(ParamSchema::new().require("message", ParamType::String)),
        )
        .build()
}

fn echo(params: &Params) -> Result<Value, RpcError> {
    let message = params.require_str("message")?;
    Ok(json!({
        "message": message,
        "timestamp": clock::rfc3339_now(),
    }))
}
