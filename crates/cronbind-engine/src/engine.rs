use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::handler::{Engine, FireHandler, JobHandle};
use crate::types::{FireContext, JobKey, JobSpec, MisfireInstruction, TriggerSpec};

/// Tuning knobs for [`CronEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the tick loop polls for due triggers.
    pub tick_interval: Duration,
    /// A fire later than this counts as a misfire and is handled per the
    /// trigger's [`MisfireInstruction`].
    pub misfire_threshold: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            misfire_threshold: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_misfire_threshold(mut self, threshold: Duration) -> Self {
        self.misfire_threshold = threshold;
        self
    }
}

/// One live registration.
struct RegisteredJob {
    job: JobSpec,
    trigger: TriggerSpec,
    schedule: cron::Schedule,
    handler: Arc<dyn FireHandler>,
    /// `None` means the trigger is exhausted.
    next_fire: Option<DateTime<Utc>>,
}

/// In-process cron engine.
///
/// Cheaply cloneable — all clones share the same registration map, so the
/// composition root can hand out clones freely and spawn one of them on the
/// tick loop. Each due fire is dispatched on its own `spawn_blocking` worker;
/// the tick loop never waits for a handler to finish.
#[derive(Clone)]
pub struct CronEngine {
    jobs: Arc<DashMap<JobKey, RegisteredJob>>,
    config: EngineConfig,
}

impl CronEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Number of currently registered jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn contains(&self, key: &JobKey) -> bool {
        self.jobs.contains_key(key)
    }

    /// Clone of the registered job/trigger pair, for inspection.
    pub fn registration(&self, key: &JobKey) -> Option<(JobSpec, TriggerSpec)> {
        self.jobs
            .get(key)
            .map(|j| (j.job.clone(), j.trigger.clone()))
    }

    /// The next planned fire time of a job, if any.
    pub fn next_fire(&self, key: &JobKey) -> Option<DateTime<Utc>> {
        self.jobs.get(key).and_then(|j| j.next_fire)
    }

    /// Snapshot of every registered job/trigger pair, in no particular order.
    pub fn registrations(&self) -> Vec<(JobSpec, TriggerSpec)> {
        self.jobs
            .iter()
            .map(|entry| (entry.value().job.clone(), entry.value().trigger.clone()))
            .collect()
    }

    /// Tick loop. Polls until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(tick = ?self.config.tick_interval, "cron engine started");
        let mut interval = tokio::time::interval(self.config.tick_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(Utc::now()),
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("cron engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Dispatch every trigger due at `now`, highest priority first.
    fn tick(&self, now: DateTime<Utc>) {
        // Collect keys first so no map reference is held across dispatch —
        // handlers may unregister jobs (their own or others') while we loop.
        let mut due: Vec<(JobKey, i32)> = self
            .jobs
            .iter()
            .filter_map(|entry| match entry.value().next_fire {
                Some(at) if at <= now => {
                    Some((entry.key().clone(), entry.value().trigger.priority))
                }
                _ => None,
            })
            .collect();
        due.sort_by_key(|(_, priority)| std::cmp::Reverse(*priority));

        for (key, _) in due {
            self.fire_one(&key, now);
        }
    }

    fn fire_one(&self, key: &JobKey, now: DateTime<Utc>) {
        let misfire_threshold = chrono::Duration::from_std(self.config.misfire_threshold)
            .unwrap_or_else(|_| chrono::Duration::seconds(5));

        // Re-check under the entry: the job may be gone since collection.
        let Some(mut entry) = self.jobs.get_mut(key) else {
            return;
        };
        let Some(scheduled) = entry.next_fire else {
            return;
        };
        if scheduled > now {
            return;
        }

        if let Some(end) = entry.trigger.end_at {
            if scheduled > end {
                drop(entry);
                self.remove(key, "trigger end time reached");
                return;
            }
        }

        let misfired = now - scheduled > misfire_threshold;
        let mut should_fire = true;
        let next = if misfired {
            match entry.trigger.misfire {
                MisfireInstruction::DoNothing => {
                    should_fire = false;
                    entry.schedule.after(&now).next()
                }
                MisfireInstruction::FireAndProceed => entry.schedule.after(&now).next(),
                // Keep the original timeline: the computed next may itself be
                // in the past, so the job catches up one occurrence per tick.
                MisfireInstruction::IgnoreMisfires => entry.schedule.after(&scheduled).next(),
            }
        } else {
            entry.schedule.after(&now).next()
        };

        entry.next_fire = match (next, entry.trigger.end_at) {
            (Some(at), Some(end)) if at > end => None,
            (at, _) => at,
        };
        let exhausted = entry.next_fire.is_none();

        if should_fire {
            let ctx = FireContext {
                fire_id: Uuid::new_v4().to_string(),
                job: entry.job.key.clone(),
                description: entry.job.description.clone(),
                scheduled_time: scheduled,
                fire_time: now,
                handle: JobHandle::new(key.clone(), Arc::new(self.clone())),
            };
            let handler = Arc::clone(&entry.handler);
            drop(entry);

            debug!(job = %key, fire_id = %ctx.fire_id, "dispatching fire");
            // User code may block; keep it off the tick loop's runtime threads.
            tokio::task::spawn_blocking(move || handler.on_fire(&ctx));
        } else {
            warn!(job = %key, late = %(now - scheduled), "misfire: occurrence skipped");
            drop(entry);
        }

        if exhausted {
            self.remove(key, "trigger exhausted");
        }
    }

    fn remove(&self, key: &JobKey, reason: &str) {
        if self.jobs.remove(key).is_some() {
            info!(job = %key, reason, "job unregistered");
        }
    }
}

impl Default for CronEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for CronEngine {
    fn register(
        &self,
        job: JobSpec,
        trigger: TriggerSpec,
        handler: Arc<dyn FireHandler>,
    ) -> Result<JobHandle> {
        let schedule =
            cron::Schedule::from_str(&trigger.cron).map_err(|e| EngineError::InvalidCron {
                expr: trigger.cron.clone(),
                detail: e.to_string(),
            })?;

        let next_fire = match trigger.start_at {
            Some(start) => schedule.after(&start).next(),
            None => schedule.upcoming(Utc).next(),
        };
        let next_fire = match (next_fire, trigger.end_at) {
            (Some(at), Some(end)) if at > end => None,
            (at, _) => at,
        };

        let key = job.key.clone();
        match self.jobs.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(EngineError::Duplicate { key });
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                info!(job = %key, cron = %trigger.cron, next = ?next_fire, "job registered");
                slot.insert(RegisteredJob {
                    job,
                    trigger,
                    schedule,
                    handler,
                    next_fire,
                });
            }
        }

        Ok(JobHandle::new(key, Arc::new(self.clone())))
    }

    fn unregister(&self, key: &JobKey) -> Result<bool> {
        let removed = self.jobs.remove(key).is_some();
        if removed {
            info!(job = %key, "job unregistered");
        }
        Ok(removed)
    }
}
