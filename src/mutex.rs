//! The binary mutex contract every lock variant is composed from, plus two
//! ready-made implementations.

use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use spin::{relax::Spin, RelaxStrategy};

/// A two-state lock with timed acquire and infallible release.
///
/// Every reader-writer lock in this crate is built exclusively out of values
/// implementing this trait plus plain integer counters; the trait is the
/// crate's only external collaborator.
///
/// Implementations must honor:
///
/// - `acquire(true, None)`: wait indefinitely, always returns `true`.
/// - `acquire(true, Some(d))`: wait at most `d`, `true` on success, `false`
///   on timeout.
/// - `acquire(false, _)`: try-acquire, returns immediately — equivalent to
///   `acquire(true, Some(Duration::ZERO))`.
/// - `release()`: callable only by the current holder, non-blocking, cannot
///   fail.
pub trait BinaryMutex: Send + Sync {
    /// Attempts to acquire the mutex, waiting according to `blocking` and
    /// `timeout` as described on the trait.
    fn acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool;

    /// Releases the mutex. Only ever called by the current holder.
    fn release(&self);
}

#[derive(Debug, Default)]
struct TicketQueue {
    next_ticket: u64,
    now_serving: u64,
    /// Tickets whose holder gave up before being served. Kept so that
    /// `release` can skip over them instead of stalling the queue forever
    /// on a ticket nobody will ever claim.
    abandoned: BTreeSet<u64>,
}

/// The platform's standard binary mutex: a ticket-queue built on
/// `std::sync::Mutex` and `Condvar`.
///
/// Every `acquire` draws a ticket and waits until it is `now_serving`,
/// the same technique the teacher crate this one grew out of used for its
/// own wait queue (there, a busy-spinning [`spin::mutex::TicketMutex`];
/// here, a thread-parking one with timeout support). Service is therefore
/// strict FIFO order of arrival, which is what makes [`crate::FairLock`]'s
/// fairness guarantee meaningful with the default mutex: the turnstile it
/// serializes on is itself arrival-ordered.
///
/// This is the default `BinaryMutex` used by every lock type in this crate
/// when no explicit mutex factory is supplied.
#[derive(Debug, Default)]
pub struct StdBinaryMutex {
    queue: Mutex<TicketQueue>,
    condvar: Condvar,
}

impl StdBinaryMutex {
    /// Creates a new, unheld mutex.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(TicketQueue::default()),
            condvar: Condvar::new(),
        }
    }
}

impl BinaryMutex for StdBinaryMutex {
    fn acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        let mut queue = self.queue.lock().unwrap_or_else(|poison| poison.into_inner());
        let ticket = queue.next_ticket;
        queue.next_ticket += 1;

        let deadline = if !blocking {
            Some(Instant::now())
        } else {
            timeout.map(|timeout| Instant::now() + timeout)
        };

        loop {
            if queue.now_serving == ticket {
                return true;
            }

            match deadline {
                None => {
                    queue = self
                        .condvar
                        .wait(queue)
                        .unwrap_or_else(|poison| poison.into_inner());
                }
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        queue.abandoned.insert(ticket);
                        return false;
                    }
                    let (q, _) = self
                        .condvar
                        .wait_timeout(queue, remaining)
                        .unwrap_or_else(|poison| poison.into_inner());
                    queue = q;
                }
            }
        }
    }

    fn release(&self) {
        let mut queue = self.queue.lock().unwrap_or_else(|poison| poison.into_inner());
        queue.now_serving += 1;
        loop {
            let current = queue.now_serving;
            if !queue.abandoned.remove(&current) {
                break;
            }
            queue.now_serving += 1;
        }
        drop(queue);
        self.condvar.notify_all();
    }
}

/// A busy-polling `BinaryMutex` built on [`spin::Mutex`], for call sites
/// willing to trade OS thread parking for latency on very short critical
/// sections.
///
/// Unlike [`StdBinaryMutex`] this does not track arrival order: waiters
/// race for `try_lock` on every poll, so using it as the turnstile of a
/// [`crate::FairLock`] degrades fairness to whatever the OS scheduler
/// happens to do. Prefer `StdBinaryMutex` there; `SpinBinaryMutex` is meant
/// for `ReadPreferringLock`/`WritePreferringLock` critical sections short
/// enough that parking overhead would dominate.
#[derive(Debug, Default)]
pub struct SpinBinaryMutex {
    held: spin::Mutex<bool>,
}

impl SpinBinaryMutex {
    /// Creates a new, unheld mutex.
    pub fn new() -> Self {
        Self {
            held: spin::Mutex::new(false),
        }
    }
}

impl BinaryMutex for SpinBinaryMutex {
    fn acquire(&self, blocking: bool, timeout: Option<Duration>) -> bool {
        let deadline = match (blocking, timeout) {
            (false, _) => Some(Instant::now()),
            (true, None) => None,
            (true, Some(timeout)) => Some(Instant::now() + timeout),
        };

        loop {
            {
                let mut held = self.held.lock();
                if !*held {
                    *held = true;
                    return true;
                }
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return false;
                }
            }

            Spin::relax();
        }
    }

    fn release(&self) {
        let mut held = self.held.lock();
        debug_assert!(*held, "release called on a mutex that is not held");
        *held = false;
    }
}
