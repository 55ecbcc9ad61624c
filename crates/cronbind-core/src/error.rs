use thiserror::Error;

/// Errors from the host-side collaborators.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration file could not be read or merged.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
