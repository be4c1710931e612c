//! The write-preferring lock: once any writer is waiting, new readers are
//! forced to queue behind it.
//!
//! Built from five mutexes and two counters — see [`WritePreferringLock`].

use std::cell::UnsafeCell;
use std::time::Duration;

use tracing::{debug, trace};

use crate::deadline::Deadline;
use crate::guard::{ReaderGuard, ReaderOps, WriterGuard, WriterOps};
use crate::mutex::{BinaryMutex, StdBinaryMutex};

/// A reader-writer lock that prefers writers: the first arriving writer
/// closes `lock_read_try`, gating every subsequent reader, then writers
/// contend pairwise on `resource`. Readers already past `lock_read_try`
/// when the gate closed complete normally; new readers queue behind
/// `lock_read_try` until the writer cohort has fully drained.
///
/// `lock_read_entry` serializes reader arrivals, so a waiting writer holding
/// `lock_read_try` reliably blocks every reader that has not yet entered.
/// `lock_read_count` and `lock_write_count` serialize the two counters.
pub struct WritePreferringLock<M: BinaryMutex = StdBinaryMutex> {
    read_count: UnsafeCell<usize>,
    write_count: UnsafeCell<usize>,
    resource: M,
    lock_read_count: M,
    lock_write_count: M,
    lock_read_entry: M,
    lock_read_try: M,
}

// SAFETY: `read_count` is only touched while `lock_read_count` is held,
// `write_count` only while `lock_write_count` is held.
unsafe impl<M: BinaryMutex> Send for WritePreferringLock<M> {}
unsafe impl<M: BinaryMutex> Sync for WritePreferringLock<M> {}

impl<M: BinaryMutex + Default> Default for WritePreferringLock<M> {
    fn default() -> Self {
        Self::with_mutexes(M::default)
    }
}

impl<M: BinaryMutex + Default> WritePreferringLock<M> {
    /// Creates a new lock using `M::default()` for each internal mutex.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: BinaryMutex> WritePreferringLock<M> {
    /// Creates a new lock, obtaining each internal mutex from `factory`.
    pub fn with_mutexes(mut factory: impl FnMut() -> M) -> Self {
        Self {
            read_count: UnsafeCell::new(0),
            write_count: UnsafeCell::new(0),
            resource: factory(),
            lock_read_count: factory(),
            lock_write_count: factory(),
            lock_read_entry: factory(),
            lock_read_try: factory(),
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

    /// # Safety / invariant
    ///
    /// Callers must hold `lock_write_count` for the duration of any access
    /// through the returned reference.
    fn write_count(&self) -> &mut usize {
        unsafe { &mut *self.write_count.get() }
    }
}

impl<M: BinaryMutex> ReaderOps for WritePreferringLock<M> {
    fn reader_try_acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        let deadline = Deadline::new(blocking, timeout);

        if !deadline.sub_acquire(&self.lock_read_entry) {
            trace!(target: "rwsched::write_preferring", "reader timed out on lock_read_entry");
            return false;
        }
        if !deadline.sub_acquire(&self.lock_read_try) {
            self.lock_read_entry.release();
            trace!(target: "rwsched::write_preferring", "reader timed out on lock_read_try");
            return false;
        }
        if !deadline.sub_acquire(&self.lock_read_count) {
            self.lock_read_try.release();
            self.lock_read_entry.release();
            trace!(target: "rwsched::write_preferring", "reader timed out on lock_read_count");
            return false;
        }

        let count = self.read_count();
        *count += 1;
        if *count == 1 && !deadline.sub_acquire(&self.resource) {
            self.lock_read_try.release();
            self.lock_read_entry.release();
            *count -= 1;
            self.lock_read_count.release();
            trace!(target: "rwsched::write_preferring", "reader timed out on resource");
            return false;
        }

        self.lock_read_count.release();
        self.lock_read_try.release();
        self.lock_read_entry.release();
        debug!(target: "rwsched::write_preferring", "reader acquired");
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
        debug!(target: "rwsched::write_preferring", "reader released");
    }
}

impl<M: BinaryMutex> WriterOps for WritePreferringLock<M> {
    fn writer_try_acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        let deadline = Deadline::new(blocking, timeout);

        if !deadline.sub_acquire(&self.lock_write_count) {
            trace!(target: "rwsched::write_preferring", "writer timed out on lock_write_count");
            return false;
        }

        let count = self.write_count();
        *count += 1;
        if *count == 1 && !deadline.sub_acquire(&self.lock_read_try) {
            *count -= 1;
            self.lock_write_count.release();
            trace!(target: "rwsched::write_preferring", "writer timed out on lock_read_try");
            return false;
        }
        self.lock_write_count.release();

        if !deadline.sub_acquire(&self.resource) {
            self.lock_write_count.acquire(true, None);
            let count = self.write_count();
            *count -= 1;
            if *count == 0 {
                self.lock_read_try.release();
            }
            self.lock_write_count.release();
            trace!(target: "rwsched::write_preferring", "writer timed out on resource");
            return false;
        }

        debug!(target: "rwsched::write_preferring", "writer acquired");
        true
    }

    fn writer_release(&self) {
        self.resource.release();
        self.lock_write_count.acquire(true, None);
        let count = self.write_count();
        debug_assert!(*count > 0, "writer_release with write_count already 0");
        *count -= 1;
        if *count == 0 {
            self.lock_read_try.release();
        }
        self.lock_write_count.release();
        debug!(target: "rwsched::write_preferring", "writer released");
    }
}
