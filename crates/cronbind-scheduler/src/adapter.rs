use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use cronbind_core::Properties;
use cronbind_engine::{FireContext, FireHandler};

use crate::args::ArgPlan;
use crate::config::ScheduleConfig;
use crate::error::SchedulerError;
use crate::guard::InvocationGuard;
use crate::method::MethodRef;

/// Bridges one scheduled method into the engine's fire callback.
///
/// The adapter is the only thing the engine ever calls, and it promises the
/// engine will never see an unhandled error: invocation failures and panics
/// are caught here and turned into the declaration's error policy.
pub struct JobAdapter {
    method: MethodRef,
    plan: ArgPlan,
    config: ScheduleConfig,
    props: Arc<Properties>,
    guard: InvocationGuard,
    removed: AtomicBool,
}

impl JobAdapter {
    pub fn new(
        method: MethodRef,
        plan: ArgPlan,
        config: ScheduleConfig,
        props: Arc<Properties>,
    ) -> Self {
        let guard = InvocationGuard::new(config.allow_concurrent);
        Self {
            method,
            plan,
            config,
            props,
            guard,
            removed: AtomicBool::new(false),
        }
    }

    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    /// Whether the adapter has removed itself after an invocation error.
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    /// Unregister the job, at most once. Late fires already in flight become
    /// no-ops.
    fn remove(&self, ctx: &FireContext) {
        if self.removed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(err) = ctx.handle.unregister() {
            error!(job = %ctx.job, %err, "Failed to unregister scheduled method");
        }
    }

    fn apply_error_policy(&self, ctx: &FireContext, err: SchedulerError) {
        if self.config.remove_on_error {
            warn!(
                job = %ctx.job,
                method = self.method.name(),
                %err,
                "Scheduled method failed; removing it",
            );
            self.remove(ctx);
        } else if self.config.force_keep {
            warn!(
                job = %ctx.job,
                method = self.method.name(),
                %err,
                "Scheduled method failed; keeping it registered",
            );
        } else {
            warn!(
                job = %ctx.job,
                method = self.method.name(),
                %err,
                "Scheduled method failed; removing it",
            );
            self.remove(ctx);
        }
    }
}

impl FireHandler for JobAdapter {
    fn on_fire(&self, ctx: &FireContext) {
        if self.is_removed() {
            return;
        }

        let Some(_permit) = self.guard.enter() else {
            debug!(
                job = %ctx.job,
                method = self.method.name(),
                "Previous invocation still running, skipping this fire",
            );
            return;
        };

        let args = self.plan.materialize(ctx, &self.props);
        let outcome = catch_unwind(AssertUnwindSafe(|| self.method.invoke(&args)));

        let err = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => SchedulerError::Invocation(err),
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "invocation panicked".to_string());
                SchedulerError::Invocation(anyhow::anyhow!(msg))
            }
        };

        self.apply_error_policy(ctx, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use chrono::Utc;
    use cronbind_engine::{Engine, JobHandle, JobKey, JobSpec, Result as EngineResult, TriggerSpec};

    use crate::args;

    /// Engine stand-in that only records unregister calls. Cheap to clone;
    /// clones share state.
    #[derive(Clone, Default)]
    struct RecordingEngine {
        unregistered: Arc<Mutex<Vec<JobKey>>>,
    }

    impl RecordingEngine {
        fn unregistered(&self) -> Vec<JobKey> {
            self.unregistered.lock().unwrap().clone()
        }
    }

    impl Engine for RecordingEngine {
        fn register(
            &self,
            job: JobSpec,
            _trigger: TriggerSpec,
            _handler: Arc<dyn FireHandler>,
        ) -> EngineResult<JobHandle> {
            Ok(JobHandle::new(job.key, Arc::new(self.clone())))
        }

        fn unregister(&self, key: &JobKey) -> EngineResult<bool> {
            self.unregistered.lock().unwrap().push(key.clone());
            Ok(true)
        }
    }

    fn fire_context(engine: &RecordingEngine) -> FireContext {
        let key = JobKey::new("job", "group");
        let now = Utc::now();
        FireContext {
            fire_id: "test-fire".to_string(),
            job: key.clone(),
            description: "a test job".to_string(),
            scheduled_time: now,
            fire_time: now,
            handle: JobHandle::new(key, Arc::new(engine.clone())),
        }
    }

    fn adapter(method: MethodRef, config: ScheduleConfig) -> JobAdapter {
        let plan = args::plan(&method).unwrap();
        JobAdapter::new(method, plan, config, Arc::new(Properties::default()))
    }

    #[test]
    fn successful_fire_leaves_job_registered() {
        let engine = RecordingEngine::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let adapter = adapter(
            MethodRef::no_args("ok", move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            ScheduleConfig::new("* * * * * ?"),
        );

        adapter.on_fire(&fire_context(&engine));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!adapter.is_removed());
        assert!(engine.unregistered().is_empty());
    }

    #[test]
    fn failing_fire_removes_job_by_default() {
        let engine = RecordingEngine::default();
        let adapter = adapter(
            MethodRef::no_args("broken", || anyhow::bail!("boom")),
            ScheduleConfig::new("* * * * * ?"),
        );

        adapter.on_fire(&fire_context(&engine));

        assert!(adapter.is_removed());
        assert_eq!(engine.unregistered(), vec![JobKey::new("job", "group")]);
    }

    #[test]
    fn force_keep_preserves_failing_job() {
        let engine = RecordingEngine::default();
        let adapter = adapter(
            MethodRef::no_args("broken", || anyhow::bail!("boom")),
            ScheduleConfig::new("* * * * * ?").with_force_keep(true),
        );

        adapter.on_fire(&fire_context(&engine));
        adapter.on_fire(&fire_context(&engine));

        assert!(!adapter.is_removed());
        assert!(engine.unregistered().is_empty());
    }

    #[test]
    fn remove_on_error_wins_over_force_keep() {
        let engine = RecordingEngine::default();
        let adapter = adapter(
            MethodRef::no_args("broken", || anyhow::bail!("boom")),
            ScheduleConfig::new("* * * * * ?")
                .with_remove_on_error(true)
                .with_force_keep(true),
        );

        adapter.on_fire(&fire_context(&engine));

        assert!(adapter.is_removed());
        assert_eq!(engine.unregistered().len(), 1);
    }

    #[test]
    fn panicking_fire_is_absorbed_and_removes_job() {
        let engine = RecordingEngine::default();
        let adapter = adapter(
            MethodRef::no_args("panics", || panic!("unexpected state")),
            ScheduleConfig::new("* * * * * ?"),
        );

        adapter.on_fire(&fire_context(&engine));

        assert!(adapter.is_removed());
        assert_eq!(engine.unregistered().len(), 1);
    }

    #[test]
    fn fires_after_removal_are_no_ops() {
        let engine = RecordingEngine::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let calls = Arc::clone(&count);
        let adapter = adapter(
            MethodRef::no_args("flaky", move || {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    anyhow::bail!("first fire fails")
                }
                Ok(())
            }),
            ScheduleConfig::new("* * * * * ?"),
        );

        adapter.on_fire(&fire_context(&engine));
        adapter.on_fire(&fire_context(&engine));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.unregistered().len(), 1);
    }

    #[test]
    fn overlapping_fire_is_skipped() {
        let engine = RecordingEngine::default();
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let release_rx = std::sync::Mutex::new(release_rx);
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);

        let adapter = Arc::new(adapter(
            MethodRef::no_args("slow", move || {
                c.fetch_add(1, Ordering::SeqCst);
                entered_tx.send(()).unwrap();
                release_rx.lock().unwrap().recv().unwrap();
                Ok(())
            }),
            ScheduleConfig::new("* * * * * ?"),
        ));

        let worker = {
            let adapter = Arc::clone(&adapter);
            let ctx = fire_context(&engine);
            std::thread::spawn(move || adapter.on_fire(&ctx))
        };

        entered_rx
            .recv_timeout(std::time::Duration::from_secs(1))
            .unwrap();
        adapter.on_fire(&fire_context(&engine));

        release_tx.send(()).unwrap();
        worker.join().unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
