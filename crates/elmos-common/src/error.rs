use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElmosError {
    #[error("gRPC stub not initialized")]
    NotInitialized,

    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Diagnostic text reported by the transport (unreachable, rejected, aborted).
    #[error("{0}")]
    Transport(String),

    /// The call went through but the server answered `success = false`.
    #[error("{0}")]
    Application(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ElmosError>;
