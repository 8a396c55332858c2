//! # UiLock - Loading Lock for Page Controls
//!
//! While a request runs, the controls that could start another one are
//! disabled. The lock is released by dropping the guard, so every exit path
//! of the owning operation (success, error, early return, panic unwinding)
//! re-enables the controls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct UiLock {
    name: &'static str,
    locked: Arc<AtomicBool>,
}

impl UiLock {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            locked: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Take the lock. `None` if it is already held.
    pub fn acquire(&self) -> Option<UiLockGuard> {
        if self.locked.swap(true, Ordering::SeqCst) {
            log::debug!("{}: already locked", self.name);
            return None;
        }
        log::trace!("{}: locked", self.name);
        Some(UiLockGuard {
            name: self.name,
            locked: Arc::clone(&self.locked),
        })
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// Controls bound to this lock are enabled when it is free.
    pub fn is_enabled(&self) -> bool {
        !self.is_locked()
    }
}

/// Held for the duration of one operation; unlocks on drop.
#[derive(Debug)]
pub struct UiLockGuard {
    name: &'static str,
    locked: Arc<AtomicBool>,
}

impl Drop for UiLockGuard {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::SeqCst);
        log::trace!("{}: unlocked", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = UiLock::new("submit");
        {
            let _guard = lock.acquire().unwrap();
            assert!(lock.is_locked());
            assert!(lock.acquire().is_none());
        }
        assert!(lock.is_enabled());
        assert!(lock.acquire().is_some());
    }

    #[test]
    fn test_guard_releases_on_early_return() {
        fn failing(lock: &UiLock) -> Result<(), &'static str> {
            let _guard = lock.acquire().ok_or("busy")?;
            Err("parse failure")
        }

        let lock = UiLock::new("submit");
        assert_eq!(failing(&lock), Err("parse failure"));
        assert!(!lock.is_locked());
    }
}
