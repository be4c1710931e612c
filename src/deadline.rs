//! Converts `(blocking, timeout)` acquire arguments into a single deadline and
//! slices the remaining budget across the sub-acquires of a multi-stage
//! protocol.

use std::time::{Duration, Instant};

use crate::mutex::BinaryMutex;

/// A deadline computed once at the entry of a multi-stage `acquire` and
/// consulted by every sub-acquire it issues.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Deadline {
    /// Wait indefinitely at every stage.
    Never,
    /// Give up once `Instant::now()` passes this point.
    At(Instant),
}

impl Deadline {
    /// Normalizes `(blocking, timeout)` the way every guard's `acquire` does:
    /// non-blocking is a zero-budget deadline, a blocking call with no
    /// timeout never expires, and a blocking call with a timeout expires
    /// `timeout` from now.
    pub(crate) fn new(blocking: bool, timeout: Option<Duration>) -> Self {
        match (blocking, timeout) {
            (false, _) => Deadline::At(Instant::now()),
            (true, None) => Deadline::Never,
            (true, Some(timeout)) => Deadline::At(Instant::now() + timeout),
        }
    }

    /// Budget remaining for the next sub-acquire. `None` means "no
    /// deadline, wait as long as it takes".
    fn remaining(&self) -> Option<Duration> {
        match self {
            Deadline::Never => None,
            Deadline::At(at) => Some(at.saturating_duration_since(Instant::now())),
        }
    }

    /// Issues a timed sub-acquire against `mutex` using the budget left on
    /// this deadline. Always passes `blocking = true` to the mutex: a
    /// `Deadline::At(now)` (the non-blocking case) already carries a
    /// zero-or-negative budget, which is `Duration::ZERO` after saturation,
    /// so the mutex tries exactly once.
    pub(crate) fn sub_acquire<M: BinaryMutex + ?Sized>(&self, mutex: &M) -> bool {
        mutex.acquire(true, self.remaining())
    }
}
