use elmos_common::error::{ElmosError, Result};
use serde::Deserialize;

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `unix:///path`, `tcp://host:port` or `host:port`
    pub address: String,
}

impl ClientConfig {
    pub const DEFAULT_ADDRESS: &'static str = "unix:///tmp/elmos.sock";

    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(ElmosError::Config("address must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: Self::DEFAULT_ADDRESS.to_string(),
        }
    }
}
