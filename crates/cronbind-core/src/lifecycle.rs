use std::sync::Mutex;

use tracing::{debug, info};

/// A single registered startup hook.
struct StartHook {
    /// Name used for log correlation.
    name: String,
    /// Lower value = earlier execution. Ties broken by registration order.
    order: i32,
    run: Box<dyn FnOnce() + Send>,
}

/// Explicit, ordered startup phases.
///
/// Components register hooks while the application wires itself together;
/// `start()` then runs every hook exactly once, sorted ascending by order
/// (stable — registration order breaks ties). Construction-time hooks run at
/// low orders; the scheduler build phase runs late so that every schedule
/// declaration has been captured before it drains them.
pub struct Lifecycle {
    hooks: Mutex<Vec<StartHook>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
        }
    }

    /// Register a hook to run during `start()` at the given order.
    pub fn on_start(&self, name: impl Into<String>, order: i32, run: impl FnOnce() + Send + 'static) {
        let name = name.into();
        debug!(hook = %name, order, "startup hook registered");
        self.hooks
            .lock()
            .expect("lifecycle registry poisoned")
            .push(StartHook {
                name,
                order,
                run: Box::new(run),
            });
    }

    /// Run all registered hooks in order. Consumes the pending set — a second
    /// call is a no-op unless new hooks were registered in between.
    pub fn start(&self) {
        let mut hooks = {
            let mut pending = self.hooks.lock().expect("lifecycle registry poisoned");
            std::mem::take(&mut *pending)
        };
        // Stable sort preserves registration order within the same order value.
        hooks.sort_by_key(|h| h.order);

        info!(count = hooks.len(), "running startup hooks");
        for hook in hooks {
            debug!(hook = %hook.name, order = hook.order, "startup hook running");
            (hook.run)();
        }
    }

    /// Number of hooks still waiting for `start()`.
    pub fn pending(&self) -> usize {
        self.hooks.lock().expect("lifecycle registry poisoned").len()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
