use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::handler::JobHandle;

/// Default trigger priority when a declaration does not set one.
pub const DEFAULT_PRIORITY: i32 = 5;

/// Identity of a registered job: name within a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub name: String,
    pub group: String,
}

impl JobKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Identity of a trigger: name within a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerKey {
    pub name: String,
    pub group: String,
}

impl TriggerKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }
}

impl std::fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// What the engine should do when a trigger fires later than its scheduled
/// time by more than the misfire threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MisfireInstruction {
    /// Skip the missed occurrence entirely and wait for the next one.
    DoNothing,
    /// Fire once immediately, then realign to the schedule from now.
    FireAndProceed,
    /// Fire and keep following the original timeline, catching up occurrence
    /// by occurrence.
    IgnoreMisfires,
}

/// Static description of a job, as registered with the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub key: JobKey,
    pub description: String,
    /// Re-fire on engine restart. Recorded for engine implementations with a
    /// restart notion; the in-process engine has none.
    pub recoverable: bool,
    /// Keep the job stored when it has no trigger left. Recorded for engine
    /// implementations with a job store; the in-process engine removes
    /// exhausted registrations outright.
    pub durable: bool,
    /// Preserve per-invocation state across fires. Passed through from the
    /// declaration; not interpreted by this engine.
    pub persistent: bool,
}

/// Static description of a trigger, as registered with the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub key: TriggerKey,
    /// Resolved cron expression (never a property key at this point).
    pub cron: String,
    /// First fire is the first cron occurrence after this instant. `None`
    /// means fire on the next occurrence.
    pub start_at: Option<DateTime<Utc>>,
    /// No fire happens after this instant; the trigger is exhausted.
    pub end_at: Option<DateTime<Utc>>,
    /// Higher priority fires first when several triggers are due in the same
    /// tick.
    pub priority: i32,
    pub misfire: MisfireInstruction,
}

/// Per-fire execution metadata handed to the [`crate::FireHandler`].
#[derive(Clone)]
pub struct FireContext {
    /// Unique id for this one fire.
    pub fire_id: String,
    pub job: JobKey,
    pub description: String,
    /// The instant the trigger was meant to fire.
    pub scheduled_time: DateTime<Utc>,
    /// The instant the engine actually dispatched the fire.
    pub fire_time: DateTime<Utc>,
    /// Handle to the registration — lets a handler unregister its own job
    /// from within a fire.
    pub handle: JobHandle,
}

impl FireContext {
    pub fn job_description(&self) -> &str {
        &self.description
    }
}

impl std::fmt::Debug for FireContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FireContext")
            .field("fire_id", &self.fire_id)
            .field("job", &self.job)
            .field("scheduled_time", &self.scheduled_time)
            .field("fire_time", &self.fire_time)
            .finish()
    }
}
