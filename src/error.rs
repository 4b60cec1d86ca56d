// Construction-time errors.

use std::time::Duration;

/// Raised when a cache cannot be constructed. Reads and writes never fail.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("check interval must be greater than zero, got {0:?}")]
    InvalidCheckInterval(Duration),

    #[error("no tokio runtime available to run the sweeper and background rebuilds")]
    NoRuntime,

    #[error("invalid cache config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
