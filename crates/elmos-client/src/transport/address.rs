use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use elmos_common::error::ElmosError;

/// Where the backend listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// `unix:///path/to/socket`
    Unix(PathBuf),
    /// `tcp://host:port`, `http://host:port` or a bare `host:port`
    Tcp(String),
}

impl Address {
    pub fn parse(address: &str) -> Result<Self, ElmosError> {
        let invalid = |reason: &str| ElmosError::InvalidAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(invalid("address is empty"));
        }

        if let Some(path) = trimmed.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(invalid("socket path is empty"));
            }
            return Ok(Address::Unix(PathBuf::from(path)));
        }

        let authority = ["tcp://", "http://"]
            .iter()
            .find_map(|scheme| trimmed.strip_prefix(scheme))
            .unwrap_or(trimmed);
        if authority.is_empty() {
            return Err(invalid("host is empty"));
        }
        if authority.contains("://") {
            return Err(invalid("unsupported scheme"));
        }
        Ok(Address::Tcp(authority.trim_end_matches('/').to_string()))
    }
}

impl FromStr for Address {
    type Err = ElmosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Unix(path) => write!(f, "unix://{}", path.display()),
            Address::Tcp(authority) => write!(f, "tcp://{authority}"),
        }
    }
}
