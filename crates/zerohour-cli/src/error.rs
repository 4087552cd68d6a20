//! Zero Hour — front end error types.

use thiserror::Error;

/// Startup and runtime errors for the terminal front end.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Terminal input or output failed.
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be set up.
    #[error("http setup error: {0}")]
    Http(String),
}
