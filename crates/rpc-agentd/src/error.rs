//! Error taxonomy shared by every layer of the agent.
//!
//! Each failure the dispatch path can observe is converted into an
//! [`RpcError`] at the point of detection. The error carries a closed
//! [`ErrorKind`] that maps onto a JSON-RPC numeric code, plus enough
//! structured context (`details`, `request_id`, `origin`, `timestamp`,
//! `error_id`) for callers to act on it without parsing free text.
//!
//! Listeners never see anything other than these values: the dispatch core
//! turns handler panics into [`ErrorKind::InternalError`] before building a
//! response.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::clock;
use crate::protocol::{ErrorObject, RequestId};

/// Closed set of error kinds understood by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bytes were not valid JSON.
    ParseError,
    /// Envelope is structurally invalid.
    InvalidRequest,
    /// Method name does not resolve within its namespace.
    MethodNotFound,
    /// Params are missing a required field or carry the wrong type.
    InvalidParams,
    /// Uncaught failure inside a handler.
    InternalError,
    /// Generic server-side failure.
    ServerError,
    /// Namespace is not registered.
    ExtensionNotFound,
    /// Namespace is registered but not accepting calls.
    ExtensionDisabled,
    /// Stream peer exceeded the per-connection frame buffer.
    BufferOverflow,
    /// Shared state is unavailable (for example a poisoned lock).
    ServiceUnavailable,
    /// Handler did not complete before its deadline.
    Timeout,
}

impl ErrorKind {
    /// Numeric code placed on the wire.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerError => -32000,
            Self::ExtensionNotFound => -32001,
            Self::ExtensionDisabled => -32002,
            Self::BufferOverflow => -32003,
            Self::ServiceUnavailable => -32004,
            Self::Timeout => 408,
        }
    }

    /// Looks up the kind for a wire code.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            -32700 => Some(Self::ParseError),
            -32600 => Some(Self::InvalidRequest),
            -32601 => Some(Self::MethodNotFound),
            -32602 => Some(Self::InvalidParams),
            -32603 => Some(Self::InternalError),
            -32000 => Some(Self::ServerError),
            -32001 => Some(Self::ExtensionNotFound),
            -32002 => Some(Self::ExtensionDisabled),
            -32003 => Some(Self::BufferOverflow),
            -32004 => Some(Self::ServiceUnavailable),
            408 => Some(Self::Timeout),
            _ => None,
        }
    }

    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParseError => "parse_error",
            Self::InvalidRequest => "invalid_request",
            Self::MethodNotFound => "method_not_found",
            Self::InvalidParams => "invalid_params",
            Self::InternalError => "internal_error",
            Self::ServerError => "server_error",
            Self::ExtensionNotFound => "extension_not_found",
            Self::ExtensionDisabled => "extension_disabled",
            Self::BufferOverflow => "buffer_overflow",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Layer that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSource {
    /// Message decoding.
    Codec,
    /// Envelope validation, param checks and execution.
    Dispatch,
    /// Namespace and method resolution.
    Registry,
    /// Extension handler code.
    Handler,
    /// Socket layer.
    Transport,
}

impl ErrorSource {
    /// Stable label used in logs and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Codec => "codec",
            Self::Dispatch => "dispatch",
            Self::Registry => "registry",
            Self::Handler => "handler",
            Self::Transport => "transport",
        }
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Structured RPC failure.
///
/// Handlers construct these through the helper constructors and return them
/// as `Err`. The dispatch core attaches the originating request id before the
/// error is rendered into a response.
#[derive(Debug, Clone, Error)]
#[error("{kind} ({code}): {message}", code = .kind.code())]
pub struct RpcError {
    kind: ErrorKind,
    message: String,
    details: Map<String, Value>,
    request_id: RequestId,
    origin: ErrorSource,
    timestamp: String,
    error_id: Uuid,
}

impl RpcError {
    /// Creates an error of `kind`; the origin defaults to the handler layer.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Map::new(),
            request_id: RequestId::Null,
            origin: ErrorSource::Handler,
            timestamp: clock::rfc3339_now(),
            error_id: Uuid::new_v4(),
        }
    }

    /// Creates a parse error for bytes that are not valid JSON.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message).with_origin(ErrorSource::Codec)
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message).with_origin(ErrorSource::Dispatch)
    }

    /// Creates an error for a method missing from a known namespace.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorKind::MethodNotFound,
            format!("Method '{method}' not found"),
        )
        .with_origin(ErrorSource::Registry)
        .with_detail("method", method)
    }

    /// Creates an invalid params error with a free-form message.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    /// Creates an invalid params error for a required field that is absent.
    pub fn missing_param(field: &str, expected: &str) -> Self {
        Self::invalid_params(format!("Missing required parameter '{field}'"))
            .with_origin(ErrorSource::Dispatch)
            .with_detail("field", field)
            .with_detail("expected", expected)
            .with_detail("received", "missing")
    }

    /// Creates an invalid params error for a field of the wrong type.
    pub fn param_type_mismatch(field: &str, expected: &str, received: &str) -> Self {
        Self::invalid_params(format!(
            "Parameter '{field}' must be of type {expected}, received {received}"
        ))
        .with_origin(ErrorSource::Dispatch)
        .with_detail("field", field)
        .with_detail("expected", expected)
        .with_detail("received", received)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// Creates a generic server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    /// Creates an error for an unregistered namespace.
    pub fn extension_not_found(namespace: &str) -> Self {
        Self::new(
            ErrorKind::ExtensionNotFound,
            format!("Extension '{namespace}' not found"),
        )
        .with_origin(ErrorSource::Registry)
        .with_detail("extension", namespace)
    }

    /// Creates an error for a namespace that is registered but not callable.
    pub fn extension_disabled(namespace: &str) -> Self {
        Self::new(
            ErrorKind::ExtensionDisabled,
            format!("Extension '{namespace}' is disabled"),
        )
        .with_origin(ErrorSource::Registry)
        .with_detail("extension", namespace)
    }

    /// Creates an error for a stream frame larger than the buffer cap.
    pub fn buffer_overflow(limit: usize) -> Self {
        Self::new(
            ErrorKind::BufferOverflow,
            format!("Message exceeds maximum buffer size of {limit} bytes"),
        )
        .with_origin(ErrorSource::Transport)
        .with_detail("limit", limit)
    }

    /// Creates an error for unavailable shared state.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Creates a timeout error for `method` after `deadline` elapsed.
    pub fn timeout(method: &str, deadline: Duration) -> Self {
        let millis = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
        Self::new(
            ErrorKind::Timeout,
            format!("Method '{method}' timed out after {millis}ms"),
        )
        .with_origin(ErrorSource::Dispatch)
        .with_detail("method", method)
        .with_detail("timeoutMs", millis)
    }

    /// Adds a structured detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Attaches the request id this error answers.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Overrides the layer that raised the error.
    #[must_use]
    pub const fn with_origin(mut self, origin: ErrorSource) -> Self {
        self.origin = origin;
        self
    }

    /// Error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Wire code for the error kind.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.kind.code()
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured details.
    #[must_use]
    pub const fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    /// Request id the error answers.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Layer that raised the error.
    #[must_use]
    pub const fn origin(&self) -> ErrorSource {
        self.origin
    }

    /// ISO-8601 creation time.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Correlation id for logs.
    #[must_use]
    pub const fn error_id(&self) -> Uuid {
        self.error_id
    }

    /// Renders the wire error object.
    ///
    /// `data` holds the details flattened together with `errorId`, `source`
    /// and `timestamp`.
    #[must_use]
    pub fn to_error_object(&self) -> ErrorObject {
        let mut data = self.details.clone();
        data.insert("errorId".into(), Value::String(self.error_id.to_string()));
        data.insert("source".into(), Value::String(self.origin.as_str().into()));
        data.insert("timestamp".into(), Value::String(self.timestamp.clone()));
        ErrorObject {
            code: self.code(),
            message: self.message.clone(),
            data,
        }
    }
}
