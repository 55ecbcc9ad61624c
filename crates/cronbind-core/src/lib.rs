//! `cronbind-core` — host-side collaborators for the cronbind scheduler.
//!
//! Two things live here, both consumed by `cronbind-scheduler`:
//!
//! - [`config::Properties`] — a flat, string-keyed view of application
//!   configuration (cronbind.toml + `CRONBIND_*` env overrides). Schedule
//!   declarations may reference a property key instead of a literal cron
//!   expression; the key is resolved at build time, not at declaration time.
//! - [`lifecycle::Lifecycle`] — an explicit, ordered startup-hook mechanism.
//!   Components register declarations while they are constructed (low
//!   orders); the scheduler builder drains them once at a fixed late order.

pub mod config;
pub mod error;
pub mod lifecycle;

pub use config::Properties;
pub use error::{CoreError, Result};
pub use lifecycle::Lifecycle;
