use thiserror::Error;

/// Errors that can occur while planning against an environment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IquctError {
    #[error("Unsupported action space: {0}")]
    UnsupportedActionSpace(String),

    #[error("Action space has no actions")]
    EmptyActionSpace,

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Environment failure: {0}")]
    Environment(String),

    #[error("Value model failure: {0}")]
    Model(String),

    #[error("Chance node has no sampled returns")]
    Unvisited,
}

/// Convenience Result type for planning operations
pub type Result<T> = std::result::Result<T, IquctError>;
