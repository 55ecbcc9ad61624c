use serde::{Deserialize, Serialize};

use cronbind_engine::{MisfireInstruction, DEFAULT_PRIORITY};

/// Sentinel meaning "derive the job name from the method name".
pub const DEFAULT_JOB_NAME: &str = "_noJobName";
/// Sentinel job group for declarations that do not set one.
pub const DEFAULT_JOB_GROUP: &str = "_noJobGroup";
/// Sentinel description for declarations that do not set one.
pub const DEFAULT_JOB_DESCRIPTION: &str = "_noJobDescription";
/// Sentinel meaning "derive the trigger name from the method name".
pub const DEFAULT_TRIGGER_NAME: &str = "_noTriggerName";
/// Sentinel trigger group for declarations that do not set one.
pub const DEFAULT_TRIGGER_GROUP: &str = "_noTriggerGroup";
/// `scheduler_delay` value meaning "unset — use trigger_start_at instead".
pub const DEFAULT_SCHEDULER_DELAY: i64 = -1;

/// What to do when the engine misses a trigger's scheduled fire time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MisfirePolicy {
    DoNothing,
    FireAndProceed,
    Ignore,
}

impl MisfirePolicy {
    /// Map to the engine-side instruction.
    pub fn instruction(self) -> MisfireInstruction {
        match self {
            MisfirePolicy::DoNothing => MisfireInstruction::DoNothing,
            MisfirePolicy::FireAndProceed => MisfireInstruction::FireAndProceed,
            MisfirePolicy::Ignore => MisfireInstruction::IgnoreMisfires,
        }
    }
}

/// Schedule declaration for one method — the full per-method surface, with
/// the same defaults the declaration carries when a field is left unset.
///
/// The cron source is either a literal cron expression or the key of a
/// configuration property holding one. Which of the two it is gets decided
/// at build time, not at declaration time: configuration may not be loaded
/// yet when components declare their schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Literal cron expression OR configuration property key.
    pub cron_schedule: String,
    pub job_name: String,
    pub job_group: String,
    pub job_description: String,
    /// Ask the engine to re-fire the job after an engine restart.
    pub job_recovery: bool,
    /// Keep the job stored in the engine even with no trigger.
    pub job_durability: bool,
    pub trigger_name: String,
    pub trigger_group: String,
    /// Absolute trigger start, `%Y-%m-%d %H:%M:%S` UTC. Ignored whenever
    /// `scheduler_delay` is set.
    pub trigger_start_at: Option<String>,
    /// Absolute trigger end, `%Y-%m-%d %H:%M:%S` UTC.
    pub trigger_end_at: Option<String>,
    pub trigger_priority: i32,
    /// Initial delay in seconds before the first fire; `-1` means unset.
    /// When ≥ 0 this always overrides `trigger_start_at`.
    pub scheduler_delay: i64,
    pub misfire_policy: MisfirePolicy,
    /// Allow fires of this job to overlap. Usually a bad idea.
    pub allow_concurrent: bool,
    /// Preserve per-invocation state across fires (passed through to the
    /// engine, not interpreted by the core).
    pub persistent: bool,
    /// Unregister the job after the first invocation error, regardless of
    /// `force_keep`.
    pub remove_on_error: bool,
    /// Keep the job registered despite any invocation error.
    pub force_keep: bool,
}

impl ScheduleConfig {
    pub fn new(cron_schedule: impl Into<String>) -> Self {
        Self {
            cron_schedule: cron_schedule.into(),
            job_name: DEFAULT_JOB_NAME.to_string(),
            job_group: DEFAULT_JOB_GROUP.to_string(),
            job_description: DEFAULT_JOB_DESCRIPTION.to_string(),
            job_recovery: true,
            job_durability: false,
            trigger_name: DEFAULT_TRIGGER_NAME.to_string(),
            trigger_group: DEFAULT_TRIGGER_GROUP.to_string(),
            trigger_start_at: None,
            trigger_end_at: None,
            trigger_priority: DEFAULT_PRIORITY,
            scheduler_delay: DEFAULT_SCHEDULER_DELAY,
            misfire_policy: MisfirePolicy::DoNothing,
            allow_concurrent: false,
            persistent: false,
            remove_on_error: false,
            force_keep: false,
        }
    }

    pub fn with_job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = name.into();
        self
    }

    pub fn with_job_group(mut self, group: impl Into<String>) -> Self {
        self.job_group = group.into();
        self
    }

    pub fn with_job_description(mut self, description: impl Into<String>) -> Self {
        self.job_description = description.into();
        self
    }

    pub fn with_job_recovery(mut self, recovery: bool) -> Self {
        self.job_recovery = recovery;
        self
    }

    pub fn with_job_durability(mut self, durability: bool) -> Self {
        self.job_durability = durability;
        self
    }

    pub fn with_trigger_name(mut self, name: impl Into<String>) -> Self {
        self.trigger_name = name.into();
        self
    }

    pub fn with_trigger_group(mut self, group: impl Into<String>) -> Self {
        self.trigger_group = group.into();
        self
    }

    pub fn with_trigger_start_at(mut self, start_at: impl Into<String>) -> Self {
        self.trigger_start_at = Some(start_at.into());
        self
    }

    pub fn with_trigger_end_at(mut self, end_at: impl Into<String>) -> Self {
        self.trigger_end_at = Some(end_at.into());
        self
    }

    pub fn with_trigger_priority(mut self, priority: i32) -> Self {
        self.trigger_priority = priority;
        self
    }

    pub fn with_scheduler_delay(mut self, delay_secs: i64) -> Self {
        self.scheduler_delay = delay_secs;
        self
    }

    pub fn with_misfire_policy(mut self, policy: MisfirePolicy) -> Self {
        self.misfire_policy = policy;
        self
    }

    pub fn with_allow_concurrent(mut self, allow: bool) -> Self {
        self.allow_concurrent = allow;
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn with_remove_on_error(mut self, remove: bool) -> Self {
        self.remove_on_error = remove;
        self
    }

    pub fn with_force_keep(mut self, keep: bool) -> Self {
        self.force_keep = keep;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_declaration_surface() {
        let config = ScheduleConfig::new("0/2 * * * * ?");

        assert_eq!(config.job_name, DEFAULT_JOB_NAME);
        assert_eq!(config.job_group, DEFAULT_JOB_GROUP);
        assert_eq!(config.job_description, DEFAULT_JOB_DESCRIPTION);
        assert!(config.job_recovery);
        assert!(!config.job_durability);
        assert_eq!(config.trigger_name, DEFAULT_TRIGGER_NAME);
        assert_eq!(config.trigger_group, DEFAULT_TRIGGER_GROUP);
        assert_eq!(config.trigger_start_at, None);
        assert_eq!(config.trigger_end_at, None);
        assert_eq!(config.trigger_priority, DEFAULT_PRIORITY);
        assert_eq!(config.scheduler_delay, DEFAULT_SCHEDULER_DELAY);
        assert_eq!(config.misfire_policy, MisfirePolicy::DoNothing);
        assert!(!config.allow_concurrent);
        assert!(!config.persistent);
        assert!(!config.remove_on_error);
        assert!(!config.force_keep);
    }

    #[test]
    fn misfire_policy_maps_to_engine_instruction() {
        assert_eq!(
            MisfirePolicy::DoNothing.instruction(),
            MisfireInstruction::DoNothing
        );
        assert_eq!(
            MisfirePolicy::FireAndProceed.instruction(),
            MisfireInstruction::FireAndProceed
        );
        assert_eq!(
            MisfirePolicy::Ignore.instruction(),
            MisfireInstruction::IgnoreMisfires
        );
    }

    #[test]
    fn builder_methods_set_fields() {
        let config = ScheduleConfig::new("schedule.cleanup")
            .with_job_name("cleanup")
            .with_job_group("maintenance")
            .with_scheduler_delay(5)
            .with_allow_concurrent(true)
            .with_remove_on_error(true);

        assert_eq!(config.cron_schedule, "schedule.cleanup");
        assert_eq!(config.job_name, "cleanup");
        assert_eq!(config.job_group, "maintenance");
        assert_eq!(config.scheduler_delay, 5);
        assert!(config.allow_concurrent);
        assert!(config.remove_on_error);
    }
}
