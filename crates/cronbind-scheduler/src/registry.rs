use std::sync::Mutex;

use tracing::debug;

use crate::config::ScheduleConfig;
use crate::method::MethodRef;

/// One captured schedule declaration: a method plus its declared config.
#[derive(Debug)]
pub struct Declaration {
    pub method: MethodRef,
    pub config: ScheduleConfig,
}

/// Collects schedule declarations during startup.
///
/// Components call [`capture`](ScheduleRegistry::capture) as they are
/// constructed; the builder drains the lot once, after configuration is
/// loaded. Capturing never touches the engine and never fails. Insertion
/// order is preserved so building is deterministic.
#[derive(Debug, Default)]
pub struct ScheduleRegistry {
    pending: Mutex<Vec<Declaration>>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one declaration for later building.
    pub fn capture(&self, method: MethodRef, config: ScheduleConfig) {
        debug!(method = method.name(), "Captured schedule declaration");
        self.pending.lock().unwrap().push(Declaration { method, config });
    }

    /// Take every pending declaration, in insertion order. The registry is
    /// empty afterwards; a second drain yields nothing.
    pub fn drain(&self) -> Vec<Declaration> {
        std::mem::take(&mut *self.pending.lock().unwrap())
    }

    /// Number of declarations waiting to be built.
    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
