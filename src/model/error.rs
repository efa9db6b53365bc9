//! Error types for the simulation core.
//!
//! Only genuinely fatal conditions are errors here. Soft outcomes (a birth
//! site that could not be found, a reproduction attempt over the population
//! cap, a lost consumption race) are ordinary `Option`/`bool` returns on the
//! operations themselves and never cross a thread boundary.

use thiserror::Error;

/// Fatal error type for simulation operations.
#[derive(Error, Debug)]
pub enum SimError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("file system error: {0}")]
    FileSystem(#[from] std::io::Error),
}

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
