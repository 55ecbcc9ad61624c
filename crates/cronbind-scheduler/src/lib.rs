//! `cronbind-scheduler` — declarative method scheduling over a cron engine.
//!
//! # Overview
//!
//! Components declare *what* should run and *when* — a method plus a
//! [`ScheduleConfig`] — and this crate turns those declarations into live
//! engine registrations:
//!
//! - [`ScheduleRegistry`] collects declarations during startup, before
//!   configuration is available.
//! - [`SchedulerBuilder`] drains the registry at a fixed late startup phase,
//!   resolves each declaration's cron source against [`Properties`], and
//!   registers a job per method with the engine.
//! - [`JobAdapter`] is the fire callback: it resolves arguments, refuses to
//!   overlap a still-running invocation, and applies the declaration's error
//!   policy so the engine never sees an unhandled failure.
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(ScheduleRegistry::new());
//! let engine: Arc<dyn Engine> = Arc::new(CronEngine::new());
//! let props = Arc::new(Properties::load(None)?);
//! let lifecycle = Lifecycle::new();
//!
//! registry.capture(
//!     MethodRef::no_args("cleanup", || run_cleanup()),
//!     ScheduleConfig::new("schedule.cleanup").with_scheduler_delay(5),
//! );
//!
//! SchedulerBuilder::new(registry, props, engine).install(&lifecycle);
//! lifecycle.start();
//! ```

pub mod adapter;
pub mod args;
pub mod builder;
pub mod config;
pub mod error;
pub mod guard;
pub mod method;
pub mod registry;

pub use adapter::JobAdapter;
pub use args::ArgPlan;
pub use builder::{BuildReport, SchedulerBuilder, BUILD_ORDER, TRIGGER_DATETIME_FORMAT};
pub use config::{
    MisfirePolicy, ScheduleConfig, DEFAULT_JOB_DESCRIPTION, DEFAULT_JOB_GROUP, DEFAULT_JOB_NAME,
    DEFAULT_SCHEDULER_DELAY, DEFAULT_TRIGGER_GROUP, DEFAULT_TRIGGER_NAME,
};
pub use error::{Result, SchedulerError};
pub use guard::{GuardPermit, InvocationGuard};
pub use method::{ArgValue, MethodRef, ParamSpec};
pub use registry::{Declaration, ScheduleRegistry};

// Re-exported so embedding hosts only need this crate for the common path.
pub use cronbind_core::{Lifecycle, Properties};
pub use cronbind_engine::{CronEngine, Engine, EngineConfig, FireContext};
