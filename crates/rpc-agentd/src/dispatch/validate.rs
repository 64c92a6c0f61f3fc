//! Envelope validation: `RECEIVED -> VALIDATED`.

use serde_json::Value;

use crate::error::{ErrorSource, RpcError};
use crate::protocol::{JSONRPC_VERSION, Request, RequestId};

/// Checks the envelope shape and extracts a [`Request`].
///
/// The id is read first so later failures can echo it. An id of an
/// unsupported type is itself an error and is answered with `id: null`.
pub(crate) fn validate(value: Value) -> Result<Request, RpcError> {
    let Value::Object(mut object) = value else {
        return Err(RpcError::invalid_request(
            "Invalid Request: expected a JSON object",
        ));
    };

    let id = match object.remove("id") {
        None => RequestId::Null,
        Some(raw) => RequestId::from_value(&raw).ok_or_else(|| {
            RpcError::invalid_request("Invalid Request: id must be a string, number or null")
        })?,
    };

    match object.get("jsonrpc") {
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        _ => {
            return Err(RpcError::invalid_request(format!(
                "Invalid Request: jsonrpc must be \"{JSONRPC_VERSION}\""
            ))
            .with_request_id(id));
        }
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) if !method.is_empty() => method,
        _ => {
            return Err(RpcError::invalid_request(
                "Invalid Request: method must be a non-empty string",
            )
            .with_request_id(id));
        }
    };
    if !method.contains('.') {
        return Err(RpcError::invalid_request(format!(
            "Invalid method format '{method}'; expected 'namespace.method'"
        ))
        .with_detail("method", method)
        .with_request_id(id));
    }

    let params = match object.remove("params") {
        None | Some(Value::Null) => None,
        Some(Value::Object(params)) => Some(params),
        Some(_) => {
            return Err(RpcError::invalid_params("Invalid params: expected an object")
                .with_origin(ErrorSource::Dispatch)
                .with_request_id(id));
        }
    };

    Ok(Request { method, params, id })
}
