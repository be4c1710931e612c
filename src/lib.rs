//! Reader-writer locks built entirely out of plain binary mutexes.
//!
//! This crate provides three interchangeable lock types that differ only in
//! the scheduling discipline they impose on contending readers and writers:
//!
//! - [`ReadPreferringLock`] — active readers indefinitely delay a waiting
//!   writer; readers join any in-progress read group as long as one exists.
//! - [`WritePreferringLock`] — once any writer is waiting, new readers queue
//!   behind it.
//! - [`FairLock`] — readers and writers are serviced in arrival order; no
//!   class can starve the other.
//!
//! Every lock is generic over a [`BinaryMutex`] implementation, so a caller
//! can swap in any timed mutex that satisfies the trait's contract. Two
//! implementations ship by default: [`StdBinaryMutex`], a thread-parking
//! FIFO ticket queue built on `std::sync::{Mutex, Condvar}`, and
//! [`SpinBinaryMutex`], a busy-polling alternative for very short critical
//! sections.
//!
//! None of the three lock types are reentrant: a thread that holds the
//! writer side and then attempts the reader side (or vice versa) will
//! self-deadlock, or time out if given a finite timeout. Guards are not
//! `Sync` — each thread wishing to acquire should instantiate its own guard.
//!
//! # Example
//!
//! ```
//! use rwsched::{ReadPreferringLock, StdBinaryMutex};
//!
//! let lock = ReadPreferringLock::<StdBinaryMutex>::new();
//!
//! let reader = lock.reader_guard();
//! assert!(reader.acquire(true, None));
//! assert!(reader.locked());
//! reader.release().unwrap();
//! ```

mod deadline;
mod error;
mod fair;
mod guard;
mod mutex;
mod read_preferring;
mod write_preferring;

pub use error::LockError;
pub use fair::FairLock;
pub use guard::{ReaderGuard, ScopedGuard, WriterGuard};
pub use mutex::{BinaryMutex, SpinBinaryMutex, StdBinaryMutex};
pub use read_preferring::ReadPreferringLock;
pub use write_preferring::WritePreferringLock;

static_assertions::assert_impl_all!(ReadPreferringLock<StdBinaryMutex>: Send, Sync);
static_assertions::assert_impl_all!(WritePreferringLock<StdBinaryMutex>: Send, Sync);
static_assertions::assert_impl_all!(FairLock<StdBinaryMutex>: Send, Sync);
static_assertions::assert_impl_all!(StdBinaryMutex: Send, Sync, Default);
static_assertions::assert_impl_all!(SpinBinaryMutex: Send, Sync, Default);
