//! Wire shapes for JSON-RPC 2.0 requests and responses.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::RpcError;

/// Protocol version literal every envelope carries.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier echoed verbatim in the response.
///
/// Numbers stay numbers and strings stay strings; `Null` covers both an
/// explicit `null` and an absent `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier, preserved with its original representation.
    Number(Number),
    /// String identifier.
    String(String),
    /// Notification-style call or unrecoverable id.
    #[default]
    Null,
}

impl RequestId {
    /// Reads an id from a raw JSON value; other JSON types are rejected.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Number(number) => Some(Self::Number(number.clone())),
            Value::String(text) => Some(Self::String(text.clone())),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(formatter, "{number}"),
            Self::String(text) => write!(formatter, "{text:?}"),
            Self::Null => formatter.write_str("null"),
        }
    }
}

/// Request that passed envelope validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Fully qualified `namespace.method` name.
    pub method: String,
    /// Named params, absent when the caller omitted them.
    pub params: Option<Map<String, Value>>,
    /// Caller-supplied correlation id.
    pub id: RequestId,
}

/// Error member of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable summary.
    pub message: String,
    /// Structured context for programmatic handling.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

/// Outcome carried by a response: exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    /// Successful handler output.
    Result(Value),
    /// Structured failure.
    Error(ErrorObject),
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    jsonrpc: &'static str,
    #[serde(flatten)]
    payload: ResponsePayload,
    id: RequestId,
}

impl Response {
    /// Builds a success response.
    #[must_use]
    pub const fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            payload: ResponsePayload::Result(result),
            id,
        }
    }

    /// Builds an error response addressed to the error's request id.
    #[must_use]
    pub fn failure(error: &RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            payload: ResponsePayload::Error(error.to_error_object()),
            id: error.request_id().clone(),
        }
    }

    /// Id this response answers.
    #[must_use]
    pub const fn id(&self) -> &RequestId {
        &self.id
    }

    /// Result member, when the call succeeded.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match &self.payload {
            ResponsePayload::Result(value) => Some(value),
            ResponsePayload::Error(_) => None,
        }
    }

    /// Error member, when the call failed.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorObject> {
        match &self.payload {
            ResponsePayload::Result(_) => None,
            ResponsePayload::Error(error) => Some(error),
        }
    }

    /// Returns `true` when the response carries an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }
}

/// Reply produced for one decoded message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// Reply to a single request.
    Single(Response),
    /// Replies to a batch, in request order.
    Batch(Vec<Response>),
}

impl Outgoing {
    /// Serializes the reply as one newline-terminated JSON document.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Single(response) => super::encode(response),
            Self::Batch(responses) => super::encode_batch(responses),
        }
    }
}

impl From<Response> for Outgoing {
    fn from(response: Response) -> Self {
        Self::Single(response)
    }
}
