//! Guard lifecycle: the state machine shared by every reader and writer
//! guard across all three lock variants, plus the scoped-acquisition RAII
//! adapter.

use std::cell::Cell;
use std::time::Duration;

use crate::error::LockError;

/// Implemented by each lock variant for its reader side.
pub(crate) trait ReaderOps {
    fn reader_try_acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool;
    fn reader_release(&self);
}

/// Implemented by each lock variant for its writer side.
pub(crate) trait WriterOps {
    fn writer_try_acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool;
    fn writer_release(&self);
}

/// A handle owning at most one reader acquisition of its parent lock.
///
/// Not `Sync`: a guard is not meant to be shared across threads (each
/// thread wishing to acquire should instantiate its own guard). It is
/// `Send` so ownership may move between threads between uses.
pub struct ReaderGuard<'a, L: ReaderOps> {
    lock: &'a L,
    locked: Cell<bool>,
}

/// A handle owning at most one writer acquisition of its parent lock.
///
/// Same sharing rules as [`ReaderGuard`].
pub struct WriterGuard<'a, L: WriterOps> {
    lock: &'a L,
    locked: Cell<bool>,
}

impl<'a, L: ReaderOps> ReaderGuard<'a, L> {
    pub(crate) fn new(lock: &'a L) -> Self {
        Self {
            lock,
            locked: Cell::new(false),
        }
    }

    /// Attempts to acquire the reader side of the parent lock.
    ///
    /// `blocking = true, timeout = None` waits indefinitely. `blocking =
    /// true, timeout = Some(d)` waits at most `d`. `blocking = false` tries
    /// once and returns immediately, equivalent to `timeout =
    /// Some(Duration::ZERO)`.
    ///
    /// Calling `acquire` on a guard that is already `locked()` returns
    /// `false` without touching the lock — this crate rejects re-entrant
    /// acquisition on a single guard rather than silently overwriting it.
    pub fn acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        if self.locked.get() {
            return false;
        }
        let acquired = self.lock.reader_try_acquire(blocking, timeout);
        self.locked.set(acquired);
        acquired
    }

    /// Releases a previously acquired reader guard.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::NotLocked`] if this guard is not currently
    /// holding an acquisition; the lock is left untouched.
    pub fn release(&self) -> Result<(), LockError> {
        if !self.locked.get() {
            return Err(LockError::NotLocked);
        }
        self.lock.reader_release();
        self.locked.set(false);
        Ok(())
    }

    /// Returns whether this guard currently holds an acquisition.
    pub fn locked(&self) -> bool {
        self.locked.get()
    }

    /// Acquires indefinitely and returns an RAII adapter that releases on
    /// `Drop`, including when the scope unwinds through a panic.
    ///
    /// Returns `None` without touching the lock if this guard is already
    /// `locked()` — the same double-acquire rejection [`Self::acquire`]
    /// applies, surfaced here so a rejected acquisition never yields an
    /// adapter that would release an acquisition it did not make.
    pub fn scoped(&self) -> Option<ScopedGuard<'_, Self>> {
        if !self.acquire(true, None) {
            return None;
        }
        Some(ScopedGuard::new(self))
    }
}

impl<'a, L: WriterOps> WriterGuard<'a, L> {
    pub(crate) fn new(lock: &'a L) -> Self {
        Self {
            lock,
            locked: Cell::new(false),
        }
    }

    /// Attempts to acquire the writer side of the parent lock. See
    /// [`ReaderGuard::acquire`] for the `blocking`/`timeout` contract.
    pub fn acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        if self.locked.get() {
            return false;
        }
        let acquired = self.lock.writer_try_acquire(blocking, timeout);
        self.locked.set(acquired);
        acquired
    }

    /// Releases a previously acquired writer guard.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::NotLocked`] if this guard is not currently
    /// holding an acquisition; the lock is left untouched.
    pub fn release(&self) -> Result<(), LockError> {
        if !self.locked.get() {
            return Err(LockError::NotLocked);
        }
        self.lock.writer_release();
        self.locked.set(false);
        Ok(())
    }

    /// Returns whether this guard currently holds an acquisition.
    pub fn locked(&self) -> bool {
        self.locked.get()
    }

    /// Acquires indefinitely and returns an RAII adapter that releases on
    /// `Drop`, including when the scope unwinds through a panic.
    ///
    /// Returns `None` without touching the lock if this guard is already
    /// `locked()` — the same double-acquire rejection [`Self::acquire`]
    /// applies, surfaced here so a rejected acquisition never yields an
    /// adapter that would release an acquisition it did not make.
    pub fn scoped(&self) -> Option<ScopedGuard<'_, Self>> {
        if !self.acquire(true, None) {
            return None;
        }
        Some(ScopedGuard::new(self))
    }
}

/// Implemented by guard types so [`ScopedGuard`] can release generically on
/// `Drop`.
pub(crate) trait ReleasableGuard {
    fn release_for_scope(&self);
}

impl<'a, L: ReaderOps> ReleasableGuard for ReaderGuard<'a, L> {
    fn release_for_scope(&self) {
        let _ = self.release();
    }
}

impl<'a, L: WriterOps> ReleasableGuard for WriterGuard<'a, L> {
    fn release_for_scope(&self) {
        let _ = self.release();
    }
}

/// RAII adapter returned by `ReaderGuard::scoped` / `WriterGuard::scoped`.
///
/// Releases the underlying guard when dropped, whether the scope exits
/// normally or by unwinding through a panic; a panic in flight continues to
/// propagate unchanged once `drop` returns.
pub struct ScopedGuard<'g, G: ReleasableGuard> {
    guard: &'g G,
}

impl<'g, G: ReleasableGuard> ScopedGuard<'g, G> {
    fn new(guard: &'g G) -> Self {
        Self { guard }
    }
}

impl<'g, G: ReleasableGuard> Drop for ScopedGuard<'g, G> {
    fn drop(&mut self) {
        self.guard.release_for_scope();
    }
}
