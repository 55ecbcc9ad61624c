//! `cronbind-engine` — cron-capable scheduling engine.
//!
//! # Overview
//!
//! The [`Engine`] trait is the contract the scheduler core programs against:
//! register a job/trigger pair with a fire callback, unregister by key.
//! [`CronEngine`] is the in-process tokio implementation: a tick loop polls
//! registered triggers and dispatches each due fire onto its own worker
//! task, with no ordering guarantee between jobs beyond trigger priority
//! within a single tick.
//!
//! The engine owns trigger firing, cron parsing, and misfire handling; it
//! knows nothing about methods, arguments, or error policies — those live in
//! `cronbind-scheduler`, behind the [`FireHandler`] callback.
//!
//! # Lifecycle
//!
//! An engine is constructed once by the composition root, shared by cloning
//! (all clones see the same registrations), and shut down via a
//! `tokio::sync::watch` channel:
//!
//! ```ignore
//! let engine = CronEngine::new();
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! tokio::spawn(engine.clone().run(shutdown_rx));
//! // ... register jobs, serve ...
//! let _ = shutdown_tx.send(true);
//! ```

pub mod engine;
pub mod error;
pub mod handler;
pub mod types;

pub use engine::{CronEngine, EngineConfig};
pub use error::{EngineError, Result};
pub use handler::{Engine, FireHandler, JobHandle};
pub use types::{
    FireContext, JobKey, JobSpec, MisfireInstruction, TriggerKey, TriggerSpec, DEFAULT_PRIORITY,
};

/// Check that `expr` parses as a cron expression without registering anything.
pub fn validate_expression(expr: &str) -> Result<()> {
    use std::str::FromStr;
    cron::Schedule::from_str(expr)
        .map(|_| ())
        .map_err(|e| EngineError::InvalidCron {
            expr: expr.to_string(),
            detail: e.to_string(),
        })
}
