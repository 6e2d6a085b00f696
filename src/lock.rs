//! Host-supplied mutual exclusion
//!
//! The bus and the calibration state are each guarded by a lock the host
//! injects. A lock may refuse to be taken ([`LockError::Busy`]) or the wait
//! may be aborted ([`LockError::Interrupted`]); the crate reports both and
//! never retries.

use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, Ordering};

/// Reason a lock could not be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockError {
    /// Held by someone else
    Busy,
    /// The wait was aborted by the scheduler
    Interrupted,
}

/// Raw lock provided by the host
///
/// # Safety
///
/// Between a successful `lock()` and the matching `unlock()` no other caller
/// may successfully `lock()` the same lock. Data guarded by an implementor
/// that is `Sync` is shared across execution contexts on that promise alone.
pub unsafe trait RawLock {
    /// Acquire the lock
    ///
    /// # Errors
    ///
    /// Returns [`LockError`] if the lock could not be taken.
    fn lock(&self) -> Result<(), LockError>;

    /// Release a lock previously acquired with `lock()`
    fn unlock(&self);
}

// SAFETY: forwards to the referenced lock.
unsafe impl<L: RawLock + ?Sized> RawLock for &L {
    fn lock(&self) -> Result<(), LockError> {
        (**self).lock()
    }

    fn unlock(&self) {
        (**self).unlock();
    }
}

/// Non-blocking lock backed by an atomic flag
///
/// `lock()` fails with [`LockError::Busy`] instead of waiting. Share one
/// instance by reference between drivers that sit on the same bus.
#[derive(Debug, Default)]
pub struct AtomicLock {
    locked: AtomicBool,
}

impl AtomicLock {
    /// Create an unlocked lock
    #[must_use]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// `true` while held
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

// SAFETY: compare-exchange admits a single holder until `unlock()`.
unsafe impl RawLock for AtomicLock {
    fn lock(&self) -> Result<(), LockError> {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| ())
            .map_err(|_| LockError::Busy)
    }

    fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// Lock for single-context hosts
///
/// Always succeeds. It is `!Sync`, so anything it guards stays on one thread.
#[derive(Debug, Default)]
pub struct NoLock {
    _not_sync: PhantomData<*const ()>,
}

impl NoLock {
    /// Create the lock
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _not_sync: PhantomData,
        }
    }
}

// SAFETY: `NoLock` is `!Sync`, so callers are confined to one context, and the
// guarded cell never re-enters itself.
unsafe impl RawLock for NoLock {
    fn lock(&self) -> Result<(), LockError> {
        Ok(())
    }

    fn unlock(&self) {}
}

/// Value guarded by a [`RawLock`]
pub(crate) struct Guarded<L, T> {
    lock: L,
    value: UnsafeCell<T>,
}

// SAFETY: every access to `value` goes through `with()`, which holds `lock`.
unsafe impl<L: RawLock + Sync, T: Send> Sync for Guarded<L, T> {}

impl<L: RawLock, T> Guarded<L, T> {
    pub(crate) const fn new(lock: L, value: T) -> Self {
        Self {
            lock,
            value: UnsafeCell::new(value),
        }
    }

    /// Run `f` on the value with the lock held
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, LockError> {
        self.lock.lock()?;
        let _release = Release(&self.lock);
        // SAFETY: the lock is held until `_release` drops, and `f` cannot reach
        // this cell again.
        let value = unsafe { &mut *self.value.get() };
        Ok(f(value))
    }

    #[cfg(test)]
    pub(crate) fn lock_ref(&self) -> &L {
        &self.lock
    }
}

struct Release<'a, L: RawLock>(&'a L);

impl<L: RawLock> Drop for Release<'_, L> {
    fn drop(&mut self) {
        self.0.unlock();
    }
}
