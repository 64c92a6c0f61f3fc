use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two transports served by the agent.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Connection-oriented, newline-framed TCP transport.
    Stream,
    /// Connectionless UDP transport, one message per datagram.
    Datagram,
}

impl TransportKind {
    /// URL-style scheme used when rendering endpoints.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Stream => "tcp",
            Self::Datagram => "udp",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream => formatter.write_str("stream"),
            Self::Datagram => formatter.write_str("datagram"),
        }
    }
}

/// Host and port a transport listener binds to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TransportEndpoint {
    /// Transport served on this endpoint.
    pub kind: TransportKind,
    /// Host name or IP literal.
    pub host: String,
    /// Port number; `0` asks the OS for an ephemeral port.
    pub port: u16,
}

impl TransportEndpoint {
    /// Builds an endpoint for the given transport.
    #[must_use]
    pub fn new(kind: TransportKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind,
            host: host.into(),
            port,
        }
    }

    /// Builds a stream (TCP) endpoint.
    #[must_use]
    pub fn stream(host: impl Into<String>, port: u16) -> Self {
        Self::new(TransportKind::Stream, host, port)
    }

    /// Builds a datagram (UDP) endpoint.
    #[must_use]
    pub fn datagram(host: impl Into<String>, port: u16) -> Self {
        Self::new(TransportKind::Datagram, host, port)
    }
}

impl fmt::Display for TransportEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(
                formatter,
                "{}://[{}]:{}",
                self.kind.scheme(),
                self.host,
                self.port
            )
        } else {
            write!(
                formatter,
                "{}://{}:{}",
                self.kind.scheme(),
                self.host,
                self.port
            )
        }
    }
}

impl FromStr for TransportEndpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| EndpointParseError::MissingScheme(input.to_owned()))?;
        let kind = match scheme {
            "tcp" => TransportKind::Stream,
            "udp" => TransportKind::Datagram,
            other => return Err(EndpointParseError::UnsupportedScheme(other.to_owned())),
        };
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| EndpointParseError::MissingPort(input.to_owned()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(EndpointParseError::MissingHost(input.to_owned()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| EndpointParseError::InvalidPort(port.to_owned()))?;
        Ok(Self::new(kind, host, port))
    }
}

/// Errors encountered while parsing a [`TransportEndpoint`] from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointParseError {
    /// The `scheme://` prefix was absent.
    #[error("missing scheme in '{0}'")]
    MissingScheme(String),
    /// Scheme was not recognised.
    #[error("unsupported transport scheme '{0}'")]
    UnsupportedScheme(String),
    /// Host name was missing.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// Port was missing from the address.
    #[error("missing port in '{0}'")]
    MissingPort(String),
    /// Port was not a valid `u16`.
    #[error("invalid port '{0}'")]
    InvalidPort(String),
}
