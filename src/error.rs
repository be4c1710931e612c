//! Error types returned by the guard surface.

use thiserror::Error;

/// The one user-triggerable usage error in this crate.
///
/// Timeouts are reported as `bool` from `acquire` (an expected, frequent
/// outcome callers branch on), not as an error; `LockError` is reserved for
/// a genuine contract violation by the caller.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// `release()` was called on a guard that is not currently holding an
    /// acquisition, either because `acquire` was never called, last
    /// returned `false`, or a prior `release` already ran.
    #[error("cannot release un-acquired lock")]
    NotLocked,
}
