//! Analysis settings.
//!
//! A `Config` is built once at startup, validated on construction and then
//! handed by reference to every stage of the pipeline.

use crate::error::ConfigError;

pub const DEFAULT_SERVICE_PORT: u16 = 80;
pub const DEFAULT_DNS_PORT: u16 = 53;
pub const DEFAULT_RECORD_SEPARATOR: &[u8] = b"\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    service_port: u16,
    dns_port: u16,
    record_separator: Vec<u8>,
}

impl Config {
    pub fn new(
        service_port: u16,
        dns_port: u16,
        record_separator: impl Into<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        let record_separator = record_separator.into();
        if service_port == 0 {
            return Err(ConfigError::ZeroServicePort);
        }
        if dns_port == 0 {
            return Err(ConfigError::ZeroDnsPort);
        }
        if service_port == dns_port {
            return Err(ConfigError::PortConflict(service_port));
        }
        if record_separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        Ok(Self {
            service_port,
            dns_port,
            record_separator,
        })
    }

    /// Well-known port identifying the service side of a session.
    pub fn service_port(&self) -> u16 {
        self.service_port
    }

    pub fn dns_port(&self) -> u16 {
        self.dns_port
    }

    pub fn record_separator(&self) -> &[u8] {
        &self.record_separator
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_port: DEFAULT_SERVICE_PORT,
            dns_port: DEFAULT_DNS_PORT,
            record_separator: DEFAULT_RECORD_SEPARATOR.to_vec(),
        }
    }
}
