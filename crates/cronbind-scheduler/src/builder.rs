use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::{error, info, warn};

use cronbind_core::{Lifecycle, Properties};
use cronbind_engine::{validate_expression, Engine, JobKey, JobSpec, TriggerKey, TriggerSpec};

use crate::adapter::JobAdapter;
use crate::args;
use crate::config::{
    ScheduleConfig, DEFAULT_JOB_NAME, DEFAULT_SCHEDULER_DELAY, DEFAULT_TRIGGER_NAME,
};
use crate::error::{Result, SchedulerError};
use crate::registry::{Declaration, ScheduleRegistry};

/// Startup order of the build phase. Late, so every component has captured
/// its declarations before the registry is drained.
pub const BUILD_ORDER: i32 = 90;

/// Format of `trigger_start_at` / `trigger_end_at` declaration strings (UTC).
pub const TRIGGER_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one build pass over the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub registered: usize,
    pub skipped: usize,
}

/// Turns captured declarations into engine registrations.
///
/// One declaration failing to build is logged and skipped; it never prevents
/// the rest of the batch from being registered.
pub struct SchedulerBuilder {
    registry: Arc<ScheduleRegistry>,
    props: Arc<Properties>,
    engine: Arc<dyn Engine>,
}

impl SchedulerBuilder {
    pub fn new(
        registry: Arc<ScheduleRegistry>,
        props: Arc<Properties>,
        engine: Arc<dyn Engine>,
    ) -> Self {
        Self {
            registry,
            props,
            engine,
        }
    }

    /// Register the build pass as a late startup hook.
    pub fn install(self, lifecycle: &Lifecycle) {
        lifecycle.on_start("scheduler-build", BUILD_ORDER, move || {
            self.build_all();
        });
    }

    /// Drain the registry and build every pending declaration, in capture
    /// order.
    pub fn build_all(&self) -> BuildReport {
        let declarations = self.registry.drain();
        info!(count = declarations.len(), "Building scheduled methods");

        let mut report = BuildReport::default();
        for declaration in declarations {
            let method = declaration.method.name().to_string();
            match self.build_one(declaration) {
                Ok(()) => report.registered += 1,
                Err(err) => {
                    error!(%method, %err, "Skipping scheduled method");
                    report.skipped += 1;
                }
            }
        }

        info!(
            registered = report.registered,
            skipped = report.skipped,
            "Scheduled method build finished",
        );
        report
    }

    fn build_one(&self, declaration: Declaration) -> Result<()> {
        let Declaration { method, config } = declaration;

        let cron = self.resolve_cron_source(&config.cron_schedule)?;

        if config.remove_on_error && config.force_keep {
            warn!(
                method = method.name(),
                "Both remove_on_error and force_keep are set; remove_on_error wins",
            );
        }

        let (start_at, end_at) = resolve_window(&config)?;

        let job_name = if config.job_name == DEFAULT_JOB_NAME {
            method.name().to_string()
        } else {
            config.job_name.clone()
        };
        let trigger_name = if config.trigger_name == DEFAULT_TRIGGER_NAME {
            format!("{}-trigger", method.name())
        } else {
            config.trigger_name.clone()
        };

        // Unsatisfiable parameter lists fail here, not on the first fire.
        let plan = args::plan(&method)?;

        let job = JobSpec {
            key: JobKey::new(job_name, config.job_group.clone()),
            description: config.job_description.clone(),
            recoverable: config.job_recovery,
            durable: config.job_durability,
            persistent: config.persistent,
        };
        let trigger = TriggerSpec {
            key: TriggerKey::new(trigger_name, config.trigger_group.clone()),
            cron,
            start_at,
            end_at,
            priority: config.trigger_priority,
            misfire: config.misfire_policy.instruction(),
        };

        info!(
            job = %job.key,
            trigger = %trigger.key,
            cron = %trigger.cron,
            method = method.name(),
            "Registering scheduled method",
        );

        let adapter = Arc::new(JobAdapter::new(
            method,
            plan,
            config,
            Arc::clone(&self.props),
        ));
        self.engine.register(job, trigger, adapter)?;
        Ok(())
    }

    /// Resolve the declared cron source: a configuration property key wins
    /// over a literal reading, matching how most declarations name a key.
    fn resolve_cron_source(&self, source: &str) -> Result<String> {
        let expr = self.props.get(source).unwrap_or(source);
        validate_expression(expr).map_err(|e| SchedulerError::ConfigResolution {
            input: source.to_string(),
            detail: e.to_string(),
        })?;
        Ok(expr.to_string())
    }
}

/// Compute the trigger's start/end instants from the declaration.
///
/// A non-negative `scheduler_delay` always wins over `trigger_start_at`.
fn resolve_window(config: &ScheduleConfig) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let start_at = if config.scheduler_delay > DEFAULT_SCHEDULER_DELAY {
        Some(Utc::now() + chrono::Duration::seconds(config.scheduler_delay))
    } else {
        config
            .trigger_start_at
            .as_deref()
            .map(|s| parse_trigger_datetime(s, "trigger_start_at"))
            .transpose()?
    };
    let end_at = config
        .trigger_end_at
        .as_deref()
        .map(|s| parse_trigger_datetime(s, "trigger_end_at"))
        .transpose()?;
    Ok((start_at, end_at))
}

fn parse_trigger_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TRIGGER_DATETIME_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| SchedulerError::ConfigResolution {
            input: value.to_string(),
            detail: format!("{field} does not match {TRIGGER_DATETIME_FORMAT}: {e}"),
        })
}
