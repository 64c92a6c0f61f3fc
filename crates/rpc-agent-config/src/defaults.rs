use crate::transport::{TransportEndpoint, TransportKind};

/// Default interface both transports bind to.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default TCP port for the stream transport.
pub const DEFAULT_STREAM_PORT: u16 = 9101;

/// Default UDP port for the datagram transport.
pub const DEFAULT_DATAGRAM_PORT: u16 = 9102;

/// Deadline applied to a single handler invocation.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;

/// Time granted to in-flight dispatches once shutdown begins.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;

/// Inactivity window after which a stream connection is closed.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 300_000;

/// Upper bound on undelimited bytes buffered per stream connection.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Owned host value used where allocation is required (e.g. serde).
pub fn default_host_string() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default stream endpoint (`tcp://0.0.0.0:9101`).
pub fn default_stream_endpoint() -> TransportEndpoint {
    TransportEndpoint::new(TransportKind::Stream, DEFAULT_HOST, DEFAULT_STREAM_PORT)
}

/// Default datagram endpoint (`udp://0.0.0.0:9102`).
pub fn default_datagram_endpoint() -> TransportEndpoint {
    TransportEndpoint::new(TransportKind::Datagram, DEFAULT_HOST, DEFAULT_DATAGRAM_PORT)
}
