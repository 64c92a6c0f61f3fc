//! Byte-level decoding and encoding of envelopes.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{ErrorSource, RpcError};

use super::{CODEC_TARGET, Response};

/// Written when a response cannot be serialized.
const ENCODE_FALLBACK: &[u8] =
    b"{\"jsonrpc\":\"2.0\",\"error\":{\"code\":-32603,\"message\":\"failed to serialize response\"},\"id\":null}\n";

/// Decoded message awaiting envelope validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A single JSON object.
    Single(Value),
    /// A non-empty JSON array of candidate requests.
    Batch(Vec<Value>),
}

/// Parses one message.
///
/// Trailing whitespace, including the `\n` delimiter and any `\r`, is ignored.
/// Only the top-level JSON type is checked here; envelope fields are validated
/// by the dispatcher.
///
/// # Errors
///
/// Returns [`RpcError`] with kind `ParseError` when the bytes are not valid
/// UTF-8 JSON, and `InvalidRequest` when the document is neither an object
/// nor a non-empty array.
pub fn decode(bytes: &[u8]) -> Result<Incoming, RpcError> {
    let trimmed = trim_trailing_whitespace(bytes);
    let value: Value = serde_json::from_slice(trimmed)
        .map_err(|error| RpcError::parse_error(format!("Parse error: {error}")))?;

    match value {
        Value::Object(_) => Ok(Incoming::Single(value)),
        Value::Array(items) if items.is_empty() => {
            Err(RpcError::invalid_request("Invalid Request: empty batch")
                .with_origin(ErrorSource::Codec))
        }
        Value::Array(items) => Ok(Incoming::Batch(items)),
        _ => Err(
            RpcError::invalid_request("Invalid Request: expected a JSON object")
                .with_origin(ErrorSource::Codec),
        ),
    }
}

/// Serializes a response followed by exactly one `\n`.
#[must_use]
pub fn encode(response: &Response) -> Vec<u8> {
    encode_line(response)
}

/// Serializes a batch reply as one JSON array followed by `\n`.
#[must_use]
pub fn encode_batch(responses: &[Response]) -> Vec<u8> {
    encode_line(&responses)
}

fn encode_line<T: Serialize + ?Sized>(payload: &T) -> Vec<u8> {
    match serde_json::to_vec(payload) {
        Ok(mut bytes) => {
            bytes.push(b'\n');
            bytes
        }
        Err(error) => {
            warn!(target: CODEC_TARGET, %error, "failed to serialize response");
            ENCODE_FALLBACK.to_vec()
        }
    }
}

/// Trims trailing ASCII whitespace from a byte slice.
pub(crate) fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}
