use thiserror::Error;

use cronbind_engine::EngineError;

/// Errors that can occur while declaring, building, or firing scheduled
/// methods.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cron source is neither a valid cron expression nor a resolvable
    /// configuration key, or a trigger datetime does not parse. Per
    /// declaration; never fatal to the batch.
    #[error("Cannot resolve schedule '{input}': {detail}")]
    ConfigResolution { input: String, detail: String },

    /// The argument resolver cannot satisfy a declared parameter. Surfaced
    /// when the job is built, never at fire time.
    #[error("Unsupported parameter '{param}' on scheduled method '{method}'")]
    UnsupportedParameter { method: String, param: String },

    /// A scheduled method failed during a fire. Absorbed by the job
    /// adapter's error policy; never crosses back into the engine.
    #[error("Scheduled method failed: {0:#}")]
    Invocation(anyhow::Error),

    /// The engine rejected a registration.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
