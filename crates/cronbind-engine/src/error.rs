use thiserror::Error;

use crate::types::JobKey;

/// Errors that can occur within the scheduling engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The trigger's cron expression does not parse.
    #[error("Invalid cron expression '{expr}': {detail}")]
    InvalidCron { expr: String, detail: String },

    /// A job with the same key is already registered.
    #[error("Job already registered: {key}")]
    Duplicate { key: JobKey },
}

pub type Result<T> = std::result::Result<T, EngineError>;
