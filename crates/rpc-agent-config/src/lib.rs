//! Shared configuration for the rpc-agent daemon.
//!
//! Values are layered by [`ortho_config`]: built-in defaults first, then an
//! optional configuration file, then `RPC_AGENT_*` environment variables, and
//! finally command-line flags. The resolved [`Config`] is immutable once
//! loaded; the daemon reads ports, timeouts, and logging settings from it
//! during bootstrap.

mod defaults;
mod logging;
mod transport;

use std::time::Duration;

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError, OrthoResult};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CALL_TIMEOUT_MS, DEFAULT_DATAGRAM_PORT, DEFAULT_HOST, DEFAULT_IDLE_TIMEOUT_MS,
    DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES, DEFAULT_SHUTDOWN_GRACE_MS, DEFAULT_STREAM_PORT,
    default_datagram_endpoint, default_host_string, default_log_filter,
    default_log_filter_string, default_log_format, default_stream_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use transport::{EndpointParseError, TransportEndpoint, TransportKind};

/// Resolved agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "RPC_AGENT")]
pub struct Config {
    /// Interface both listeners bind to.
    #[ortho_config(default = defaults::default_host_string())]
    pub host: String,
    /// TCP port for the newline-framed stream transport.
    #[ortho_config(default = 9101)]
    pub stream_port: u16,
    /// UDP port for the datagram transport.
    #[ortho_config(default = 9102)]
    pub datagram_port: u16,
    /// Deadline for a single handler invocation, in milliseconds.
    #[ortho_config(default = 5000)]
    pub call_timeout_ms: u64,
    /// Grace period for in-flight dispatches during shutdown, in milliseconds.
    #[ortho_config(default = 5000)]
    pub shutdown_grace_ms: u64,
    /// Stream connections idle for longer than this are closed, in milliseconds.
    #[ortho_config(default = 300000)]
    pub idle_timeout_ms: u64,
    /// Maximum undelimited bytes buffered per stream connection.
    #[ortho_config(default = 1048576)]
    pub max_frame_bytes: usize,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host_string(),
            stream_port: DEFAULT_STREAM_PORT,
            datagram_port: DEFAULT_DATAGRAM_PORT,
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments, environment and files.
    ///
    /// # Errors
    ///
    /// Returns the layered loader's error when a source is malformed, or a
    /// validation error when a timeout or the frame cap is zero.
    pub fn load() -> OrthoResult<Self> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration using `args` in place of the process arguments.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from_iter<I, T>(args: I) -> OrthoResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)?.validated()
    }

    fn validated(self) -> OrthoResult<Self> {
        let zeroed = [
            ("call_timeout_ms", self.call_timeout_ms == 0),
            ("idle_timeout_ms", self.idle_timeout_ms == 0),
            ("max_frame_bytes", self.max_frame_bytes == 0),
        ];
        match zeroed.into_iter().find(|(_, is_zero)| *is_zero) {
            Some((key, _)) => Err(Arc::new(OrthoError::Validation {
                key: key.to_owned(),
                message: "must be greater than zero".to_owned(),
            })),
            None => Ok(self),
        }
    }

    /// Endpoint served by the stream listener.
    #[must_use]
    pub fn stream_endpoint(&self) -> TransportEndpoint {
        TransportEndpoint::stream(self.host.clone(), self.stream_port)
    }

    /// Endpoint served by the datagram listener.
    #[must_use]
    pub fn datagram_endpoint(&self) -> TransportEndpoint {
        TransportEndpoint::datagram(self.host.clone(), self.datagram_port)
    }

    /// Handler deadline as a [`Duration`].
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Shutdown grace period as a [`Duration`].
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Stream idle timeout as a [`Duration`].
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Per-connection frame buffer cap in bytes.
    #[must_use]
    pub const fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
