//! The read-preferring lock: active readers indefinitely delay a waiting
//! writer. Readers join any in-progress read group as long as one exists.
//!
//! Built from two mutexes and a reader counter — see [`ReadPreferringLock`].

use std::cell::UnsafeCell;
use std::time::Duration;

use tracing::{debug, trace};

use crate::deadline::Deadline;
use crate::guard::{ReaderGuard, ReaderOps, WriterGuard, WriterOps};
use crate::mutex::{BinaryMutex, StdBinaryMutex};

/// A reader-writer lock that prefers readers: a continuously replenished
/// stream of readers can indefinitely delay a waiting writer. This is
/// documented, intentional behavior, not a defect — see the write-preferring
/// [`crate::WritePreferringLock`] or [`crate::FairLock`] variants if that
/// tradeoff is unacceptable for a given resource.
///
/// `resource` is held exactly when any reader or writer is active; the
/// first reader to arrive acquires it on behalf of the whole reader cohort,
/// and the last reader to leave releases it. `lock_read_count` serializes
/// updates to the reader count.
pub struct ReadPreferringLock<M: BinaryMutex = StdBinaryMutex> {
    read_count: UnsafeCell<usize>,
    resource: M,
    lock_read_count: M,
}

// SAFETY: `read_count` is only ever read or written while `lock_read_count`
// is held, which every access path in this module enforces.
unsafe impl<M: BinaryMutex> Send for ReadPreferringLock<M> {}
unsafe impl<M: BinaryMutex> Sync for ReadPreferringLock<M> {}

impl<M: BinaryMutex + Default> Default for ReadPreferringLock<M> {
    fn default() -> Self {
        Self::with_mutexes(M::default)
    }
}

impl<M: BinaryMutex + Default> ReadPreferringLock<M> {
    /// Creates a new lock using `M::default()` for each internal mutex.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: BinaryMutex> ReadPreferringLock<M> {
    /// Creates a new lock, obtaining each internal mutex from `factory`.
    /// Useful when `M` has no meaningful `Default`.
    pub fn with_mutexes(mut factory: impl FnMut() -> M) -> Self {
        Self {
            read_count: UnsafeCell::new(0),
            resource: factory(),
            lock_read_count: factory(),
        }
    }

    /// Produces a new, initially unacquired reader guard for this lock.
    pub fn reader_guard(&self) -> ReaderGuard<'_, Self> {
        ReaderGuard::new(self)
    }

    /// Produces a new, initially unacquired writer guard for this lock.
    pub fn writer_guard(&self) -> WriterGuard<'_, Self> {
        WriterGuard::new(self)
    }

    /// # Safety / invariant
    ///
    /// Callers must hold `lock_read_count` for the duration of any access
    /// through the returned reference.
    fn read_count(&self) -> &mut usize {
        unsafe { &mut *self.read_count.get() }
    }
}

impl<M: BinaryMutex> ReaderOps for ReadPreferringLock<M> {
    fn reader_try_acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        let deadline = Deadline::new(blocking, timeout);

        if !deadline.sub_acquire(&self.lock_read_count) {
            trace!(target: "rwsched::read_preferring", "reader timed out on lock_read_count");
            return false;
        }

        let count = self.read_count();
        *count += 1;
        if *count == 1 && !deadline.sub_acquire(&self.resource) {
            *count -= 1;
            self.lock_read_count.release();
            trace!(target: "rwsched::read_preferring", "reader timed out on resource");
            return false;
        }

        self.lock_read_count.release();
        debug!(target: "rwsched::read_preferring", "reader acquired");
        true
    }

    fn reader_release(&self) {
        self.lock_read_count.acquire(true, None);
        let count = self.read_count();
        debug_assert!(*count > 0, "reader_release with read_count already 0");
        *count -= 1;
        if *count == 0 {
            self.resource.release();
        }
        self.lock_read_count.release();
        debug!(target: "rwsched::read_preferring", "reader released");
    }
}

impl<M: BinaryMutex> WriterOps for ReadPreferringLock<M> {
    fn writer_try_acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        let acquired = self.resource.acquire(blocking, timeout);
        if acquired {
            debug!(target: "rwsched::read_preferring", "writer acquired");
        } else {
            trace!(target: "rwsched::read_preferring", "writer timed out on resource");
        }
        acquired
    }

    fn writer_release(&self) {
        self.resource.release();
        debug!(target: "rwsched::read_preferring", "writer released");
    }
}
