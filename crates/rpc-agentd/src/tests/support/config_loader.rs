//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::OrthoError;
use rpc_agent_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader binding both transports to ephemeral loopback ports.
#[derive(Debug, Clone)]
pub struct TestConfigLoader {
    config: Config,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config {
                host: "127.0.0.1".into(),
                stream_port: 0,
                datagram_port: 0,
                ..Config::default()
            },
        }
    }

    /// Pins the stream port.
    #[must_use]
    pub fn with_stream_port(mut self, port: u16) -> Self {
        self.config.stream_port = port;
        self
    }

    /// Pins the datagram port.
    #[must_use]
    pub fn with_datagram_port(mut self, port: u16) -> Self {
        self.config.datagram_port = port;
        self
    }

    #[must_use]
    pub fn with_call_timeout_ms(mut self, millis: u64) -> Self {
        self.config.call_timeout_ms = millis;
        self
    }

    #[must_use]
    pub fn with_shutdown_grace_ms(mut self, millis: u64) -> Self {
        self.config.shutdown_grace_ms = millis;
        self
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that fails by passing a non-numeric port on the command line.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("rpc-agentd"),
            OsString::from("--stream-port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}
