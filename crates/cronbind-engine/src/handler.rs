use std::sync::Arc;

use crate::error::Result;
use crate::types::{FireContext, JobKey, JobSpec, TriggerSpec};

/// Callback invoked by the engine on each fire of a registered job.
///
/// Handlers run on engine worker threads and must absorb their own errors —
/// the engine never inspects the outcome of a fire.
pub trait FireHandler: Send + Sync {
    fn on_fire(&self, ctx: &FireContext);
}

/// The contract the scheduler core consumes.
///
/// Implementations own trigger firing, cron evaluation, and misfire
/// handling. Registration must validate the trigger's cron expression and
/// reject duplicate job keys; unregistration must be safe to call from
/// within a fire callback of the same job.
pub trait Engine: Send + Sync {
    /// Register a job/trigger pair. The handler is invoked on every fire
    /// until the trigger is exhausted or the job is unregistered.
    fn register(
        &self,
        job: JobSpec,
        trigger: TriggerSpec,
        handler: Arc<dyn FireHandler>,
    ) -> Result<JobHandle>;

    /// Remove a job. Returns `false` if no job with that key is registered
    /// (already removed — not an error, self-unregistration may race a
    /// concurrent removal).
    fn unregister(&self, key: &JobKey) -> Result<bool>;
}

/// Handle to one registration, returned by [`Engine::register`] and carried
/// in every [`FireContext`] so a fire can remove its own job.
#[derive(Clone)]
pub struct JobHandle {
    key: JobKey,
    engine: Arc<dyn Engine>,
}

impl JobHandle {
    pub fn new(key: JobKey, engine: Arc<dyn Engine>) -> Self {
        Self { key, engine }
    }

    pub fn key(&self) -> &JobKey {
        &self.key
    }

    /// Unregister the job this handle refers to.
    pub fn unregister(&self) -> Result<bool> {
        self.engine.unregister(&self.key)
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle").field("key", &self.key).finish()
    }
}
