use thiserror::Error;

use crate::driver::DriverError;

/// Unified error type for the relay layer.
///
/// Driver-reported failures are wrapped transparently; everything else is a
/// failure of this layer itself (parameter inlining, lifecycle, config).
#[derive(Debug, Error)]
pub enum SqlRelayError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Invalid parameter type: {0}")]
    InvalidParameterType(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}
