//! End-to-end: declarations captured at startup, built at the late lifecycle
//! phase, and fired by a real engine on real time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use cronbind_engine::JobKey;
use cronbind_scheduler::{
    CronEngine, EngineConfig, Lifecycle, MethodRef, Properties, ScheduleConfig,
    ScheduleRegistry, SchedulerBuilder, DEFAULT_JOB_GROUP,
};

/// Records the wall-clock instant of every fire.
#[derive(Clone, Default)]
struct Ticks {
    times: Arc<Mutex<Vec<DateTime<Utc>>>>,
}

impl Ticks {
    fn record(&self) {
        self.times.lock().unwrap().push(Utc::now());
    }

    fn times(&self) -> Vec<DateTime<Utc>> {
        self.times.lock().unwrap().clone()
    }
}

fn secs(d: chrono::Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}

#[tokio::test(flavor = "multi_thread")]
async fn delayed_jobs_fire_on_schedule() {
    let registry = Arc::new(ScheduleRegistry::new());
    let engine = CronEngine::new();
    let props = Arc::new(Properties::from_pairs([("schedule.slow", "0/2 * * * * ?")]));
    let lifecycle = Lifecycle::new();

    let fast_ticks = Ticks::default();
    let slow_ticks = Ticks::default();
    let slow_description = Arc::new(Mutex::new(None::<String>));

    {
        let ticks = fast_ticks.clone();
        registry.capture(
            MethodRef::no_args("fast", move || {
                ticks.record();
                Ok(())
            }),
            ScheduleConfig::new("0/2 * * * * ?").with_scheduler_delay(1),
        );
    }
    {
        let ticks = slow_ticks.clone();
        let seen = Arc::clone(&slow_description);
        registry.capture(
            MethodRef::with_context("slow", move |ctx| {
                ticks.record();
                *seen.lock().unwrap() = Some(ctx.job_description().to_string());
                Ok(())
            }),
            ScheduleConfig::new("schedule.slow")
                .with_job_description("slow ticker")
                .with_scheduler_delay(5),
        );
    }

    // Simulated startup work running before the build phase.
    lifecycle.on_start("warmup", 10, || std::thread::sleep(Duration::from_millis(300)));
    SchedulerBuilder::new(Arc::clone(&registry), props, Arc::new(engine.clone()))
        .install(&lifecycle);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(engine.clone().run(shutdown_rx));

    lifecycle.start();
    let startup_done = Utc::now();
    assert_eq!(engine.job_count(), 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let _ = shutdown_tx.send(true);

    let fast = fast_ticks.times();
    let slow = slow_ticks.times();
    assert!(fast.len() >= 2, "fast fired only {} times", fast.len());
    assert!(slow.len() >= 2, "slow fired only {} times", slow.len());

    // No fire before startup finished.
    assert!(fast[0] > startup_done);
    assert!(slow[0] > startup_done);

    // Consecutive fast fires are one cron period apart.
    for pair in fast.windows(2) {
        let delta = secs(pair[1] - pair[0]);
        assert!((1.0..=3.0).contains(&delta), "fast period was {delta}s");
    }

    // Both jobs align on the same even-second cron, four seconds of delay
    // apart, so their first fires differ by the delay difference.
    let lead = secs(slow[0] - fast[0]);
    assert!((3.0..=5.0).contains(&lead), "slow led fast by {lead}s");

    assert_eq!(
        slow_description.lock().unwrap().as_deref(),
        Some("slow ticker"),
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_job_is_removed_unless_kept() {
    let registry = Arc::new(ScheduleRegistry::new());
    let engine = CronEngine::with_config(
        EngineConfig::default().with_tick_interval(Duration::from_millis(50)),
    );
    let lifecycle = Lifecycle::new();

    let doomed_ticks = Ticks::default();
    let kept_ticks = Ticks::default();

    {
        let ticks = doomed_ticks.clone();
        registry.capture(
            MethodRef::no_args("doomed", move || {
                ticks.record();
                anyhow::bail!("always fails")
            }),
            ScheduleConfig::new("* * * * * ?"),
        );
    }
    {
        let ticks = kept_ticks.clone();
        registry.capture(
            MethodRef::no_args("kept", move || {
                ticks.record();
                anyhow::bail!("always fails")
            }),
            ScheduleConfig::new("* * * * * ?").with_force_keep(true),
        );
    }

    SchedulerBuilder::new(
        Arc::clone(&registry),
        Arc::new(Properties::default()),
        Arc::new(engine.clone()),
    )
    .install(&lifecycle);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(engine.clone().run(shutdown_rx));
    lifecycle.start();

    tokio::time::sleep(Duration::from_millis(3500)).await;
    let _ = shutdown_tx.send(true);

    // Default policy: gone after the first failed invocation.
    assert_eq!(doomed_ticks.times().len(), 1);
    assert!(!engine.contains(&JobKey::new("doomed", DEFAULT_JOB_GROUP)));

    // force_keep: still registered, still firing.
    assert!(kept_ticks.times().len() >= 2);
    assert!(engine.contains(&JobKey::new("kept", DEFAULT_JOB_GROUP)));
}
