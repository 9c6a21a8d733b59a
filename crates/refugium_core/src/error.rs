//! Error types for the simulation engine.
//!
//! Recoverable input problems are normalized by the engine itself; these
//! variants cover the few conditions that are genuine programming or usage
//! errors and must be surfaced to the caller.

use thiserror::Error;

/// Main error type for refugium_core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// The locality frame for the current tick was never recorded.
    #[error("Missing locality frame for tick {tick}")]
    MissingLocalityFrame { tick: u64 },

    /// A bounded integer was requested with an empty range.
    #[error("Invalid integer range: max exclusive bound {max_exclusive} must be positive")]
    InvalidRange { max_exclusive: usize },

    /// The configuration cannot describe a valid world.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for refugium_core operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
