use crate::api::ApiError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Errors that can occur in the TUI layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An I/O error occurred (terminal, event reading, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A storage error occurred while reading or writing the session.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The HTTP client could not be set up.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
