use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Per-job overlap guard.
///
/// A fire asks to enter before invoking the method; if a previous fire of the
/// same job is still running the request is denied immediately, it never
/// blocks. Jobs declared concurrent always get a permit.
#[derive(Debug)]
pub struct InvocationGuard {
    allow_concurrent: bool,
    running: AtomicBool,
    lock: Mutex<()>,
}

impl InvocationGuard {
    pub fn new(allow_concurrent: bool) -> Self {
        Self {
            allow_concurrent,
            running: AtomicBool::new(false),
            lock: Mutex::new(()),
        }
    }

    /// Try to enter an invocation. Returns `None` when a non-concurrent job
    /// is already mid-invocation.
    pub fn enter(&self) -> Option<GuardPermit<'_>> {
        if self.allow_concurrent {
            return Some(GuardPermit {
                guard: self,
                _lock: None,
            });
        }
        // A panicking invocation poisons the lock; the permit's Drop still
        // ran, so the state is consistent and the lock stays usable.
        let lock = match self.lock.try_lock() {
            Ok(lock) => lock,
            Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(std::sync::TryLockError::WouldBlock) => return None,
        };
        self.running.store(true, Ordering::SeqCst);
        Some(GuardPermit {
            guard: self,
            _lock: Some(lock),
        })
    }

    /// Whether a non-concurrent invocation is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Held for the duration of one invocation; releasing it re-opens the guard.
pub struct GuardPermit<'a> {
    guard: &'a InvocationGuard,
    _lock: Option<MutexGuard<'a, ()>>,
}

impl Drop for GuardPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::SeqCst);
    }
}
