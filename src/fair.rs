//! The fair lock: readers and writers are serviced in arrival order, to the
//! accuracy of the underlying turnstile mutex; no class can starve the
//! other.
//!
//! Built from three mutexes and a reader counter — see [`FairLock`].

use std::cell::UnsafeCell;
use std::time::Duration;

use tracing::{debug, trace};

use crate::deadline::Deadline;
use crate::guard::{ReaderGuard, ReaderOps, WriterGuard, WriterOps};
use crate::mutex::{BinaryMutex, StdBinaryMutex};

/// A reader-writer lock that services readers and writers in arrival order.
///
/// `lock_read` is the turnstile: every arriver, reader or writer, passes
/// through it briefly on the way in. A reader holds it only long enough to
/// update `read_count` and, for the first reader of a new cohort, to claim
/// `lock_write` on the cohort's behalf. A writer holds `lock_read` for its
/// *entire* critical section, which is what keeps new readers from cutting
/// in line while the writer waits for `lock_write`.
pub struct FairLock<M: BinaryMutex = StdBinaryMutex> {
    read_count: UnsafeCell<usize>,
    lock_write: M,
    lock_read: M,
    lock_read_count: M,
}

// SAFETY: `read_count` is only touched while `lock_read_count` is held.
unsafe impl<M: BinaryMutex> Send for FairLock<M> {}
unsafe impl<M: BinaryMutex> Sync for FairLock<M> {}

impl<M: BinaryMutex + Default> Default for FairLock<M> {
    fn default() -> Self {
        Self::with_mutexes(M::default)
    }
}

impl<M: BinaryMutex + Default> FairLock<M> {
    /// Creates a new lock using `M::default()` for each internal mutex.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: BinaryMutex> FairLock<M> {
    /// Creates a new lock, obtaining each internal mutex from `factory`.
    pub fn with_mutexes(mut factory: impl FnMut() -> M) -> Self {
        Self {
            read_count: UnsafeCell::new(0),
            lock_write: factory(),
            lock_read: factory(),
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

impl<M: BinaryMutex> ReaderOps for FairLock<M> {
    fn reader_try_acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        let deadline = Deadline::new(blocking, timeout);

        if !deadline.sub_acquire(&self.lock_read) {
            trace!(target: "rwsched::fair", "reader timed out on lock_read");
            return false;
        }
        if !deadline.sub_acquire(&self.lock_read_count) {
            self.lock_read.release();
            trace!(target: "rwsched::fair", "reader timed out on lock_read_count");
            return false;
        }

        let count = self.read_count();
        *count += 1;
        if *count == 1 && !deadline.sub_acquire(&self.lock_write) {
            *count -= 1;
            self.lock_read_count.release();
            self.lock_read.release();
            trace!(target: "rwsched::fair", "reader timed out on lock_write");
            return false;
        }

        self.lock_read_count.release();
        self.lock_read.release();
        debug!(target: "rwsched::fair", "reader acquired");
        true
    }

    fn reader_release(&self) {
        self.lock_read_count.acquire(true, None);
        let count = self.read_count();
        debug_assert!(*count > 0, "reader_release with read_count already 0");
        *count -= 1;
        if *count == 0 {
            self.lock_write.release();
        }
        self.lock_read_count.release();
        debug!(target: "rwsched::fair", "reader released");
    }
}

impl<M: BinaryMutex> WriterOps for FairLock<M> {
    fn writer_try_acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        let deadline = Deadline::new(blocking, timeout);

        if !deadline.sub_acquire(&self.lock_read) {
            trace!(target: "rwsched::fair", "writer timed out on lock_read");
            return false;
        }
        if !deadline.sub_acquire(&self.lock_write) {
            self.lock_read.release();
            trace!(target: "rwsched::fair", "writer timed out on lock_write");
            return false;
        }

        debug!(target: "rwsched::fair", "writer acquired");
        true
    }

    fn writer_release(&self) {
        self.lock_write.release();
        self.lock_read.release();
        debug!(target: "rwsched::fair", "writer released");
    }
}
