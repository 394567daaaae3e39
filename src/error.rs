use thiserror::Error;

use crate::dns::{ParseError, name::Name};

/// Errors that end a walk without a verdict.
///
/// Cryptographic failures are not here: they are verdicts, see `BogusReason`.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Walk toward {target} ran out of labels")]
    LabelWalkExhausted { target: Name },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<std::io::Error> for ValidatorError {
    fn from(err: std::io::Error) -> Self {
        ValidatorError::Transport(err.to_string())
    }
}

impl ValidatorError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ValidatorError::Transport(_) => "transport",
            ValidatorError::Parse(_) => "parse",
            ValidatorError::LabelWalkExhausted { .. } => "internal",
            ValidatorError::Config(_) => "config",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid upstream server: {0}")]
    InvalidUpstreamServer(String),
    #[error("Invalid trust anchor: {0}")]
    InvalidTrustAnchor(String),
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("Invalid EDNS payload size: {0}")]
    InvalidPayloadSize(String),
    #[error("Invalid HTTP bind address: {0}")]
    InvalidHttpBindAddress(String),
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
