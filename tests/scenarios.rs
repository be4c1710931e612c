//! End-to-end scenarios exercising each lock variant across thread
//! boundaries, mirroring the concrete test shape the teacher crate uses for
//! its own multi-threaded test (`rand`-jittered sleeps, `std::thread`,
//! `Duration`).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::Rng;

use rwsched::{FairLock, LockError, ReadPreferringLock, StdBinaryMutex, WritePreferringLock};

/// Scenario 1: single-threaded acquire/release roundtrip identical across
/// all three variants, on both the reader and writer side.
#[test]
fn single_threaded_roundtrip_is_identical_across_variants() {
    fn check_read_preferring() {
        let lock = ReadPreferringLock::<StdBinaryMutex>::new();
        let reader = lock.reader_guard();
        assert!(reader.acquire(true, None));
        assert!(reader.locked());
        reader.release().unwrap();
        assert!(!reader.locked());

        let writer = lock.writer_guard();
        assert!(writer.acquire(true, None));
        assert!(writer.locked());
        writer.release().unwrap();
        assert!(!writer.locked());
    }

    fn check_write_preferring() {
        let lock = WritePreferringLock::<StdBinaryMutex>::new();
        let reader = lock.reader_guard();
        assert!(reader.acquire(true, None));
        assert!(reader.locked());
        reader.release().unwrap();
        assert!(!reader.locked());

        let writer = lock.writer_guard();
        assert!(writer.acquire(true, None));
        assert!(writer.locked());
        writer.release().unwrap();
        assert!(!writer.locked());
    }

    fn check_fair() {
        let lock = FairLock::<StdBinaryMutex>::new();
        let reader = lock.reader_guard();
        assert!(reader.acquire(true, None));
        assert!(reader.locked());
        reader.release().unwrap();
        assert!(!reader.locked());

        let writer = lock.writer_guard();
        assert!(writer.acquire(true, None));
        assert!(writer.locked());
        writer.release().unwrap();
        assert!(!writer.locked());
    }

    check_read_preferring();
    check_write_preferring();
    check_fair();
}

/// Scenario 2: a writer holds a read-preferring lock; a reader's short
/// timed acquire fails within roughly the requested window, and the read
/// count is left at zero.
#[test]
fn read_preferring_reader_times_out_while_writer_holds() {
    let lock = Arc::new(ReadPreferringLock::<StdBinaryMutex>::new());
    let writer = lock.writer_guard();
    assert!(writer.acquire(true, None));

    let reader_lock = lock.clone();
    let started = std::time::Instant::now();
    let handle = thread::spawn(move || {
        let reader = reader_lock.reader_guard();
        reader.acquire(true, Some(Duration::from_millis(50)))
    });

    assert!(!handle.join().unwrap());
    assert!(started.elapsed() < Duration::from_millis(500));

    writer.release().unwrap();

    // The lock is usable again and its counters were not disturbed by the
    // failed acquire.
    let reader = lock.reader_guard();
    assert!(reader.acquire(true, None));
    reader.release().unwrap();
}

/// Scenario 3: write preference avoids starvation. One long-held reader,
/// then a writer arrives and waits, then ten more readers arrive. The
/// writer must complete before any of the ten later readers starts its
/// critical section.
#[test]
fn write_preferring_avoids_starvation() {
    let lock = Arc::new(WritePreferringLock::<StdBinaryMutex>::new());

    let long_reader = lock.reader_guard();
    assert!(long_reader.acquire(true, None));

    let writer_lock = lock.clone();
    let writer_done = Arc::new(AtomicBool::new(false));
    let writer_flag = writer_done.clone();
    let writer_handle = thread::spawn(move || {
        let writer = writer_lock.writer_guard();
        let acquired = writer.acquire(true, Some(Duration::from_secs(5)));
        writer_flag.store(true, Ordering::SeqCst);
        writer.release().unwrap();
        acquired
    });

    // Give the writer a head start so it registers in write_count and
    // closes lock_read_try before the ten readers below arrive.
    thread::sleep(Duration::from_millis(50));

    let saw_writer_done_first = Arc::new(Mutex::new(Vec::new()));
    let reader_handles: Vec<_> = (0..10)
        .map(|_| {
            let lock = lock.clone();
            let writer_done = writer_done.clone();
            let saw = saw_writer_done_first.clone();
            thread::spawn(move || {
                let reader = lock.reader_guard();
                assert!(reader.acquire(true, Some(Duration::from_secs(5))));
                saw.lock().unwrap().push(writer_done.load(Ordering::SeqCst));
                reader.release().unwrap();
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(100));
    long_reader.release().unwrap();

    assert!(writer_handle.join().unwrap());
    for handle in reader_handles {
        handle.join().unwrap();
    }

    for saw_done in saw_writer_done_first.lock().unwrap().iter() {
        assert!(*saw_done, "a reader entered before the waiting writer");
    }
}

/// Scenario 4: fair ordering. Five writers spawned at staggered intervals
/// on a fair lock enter their critical sections in the same order they
/// arrived.
#[test]
fn fair_lock_serves_writers_in_arrival_order() {
    const WRITERS: usize = 5;
    let lock = Arc::new(FairLock::<StdBinaryMutex>::new());

    let gate = lock.writer_guard();
    assert!(gate.acquire(true, None));

    let order = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let lock = lock.clone();
            let order = order.clone();
            thread::sleep(Duration::from_millis(10));
            thread::spawn(move || {
                let writer = lock.writer_guard();
                assert!(writer.acquire(true, Some(Duration::from_secs(5))));
                order.lock().unwrap().push(i);
                writer.release().unwrap();
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    gate.release().unwrap();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*order.lock().unwrap(), (0..WRITERS).collect::<Vec<_>>());
}

/// Scenario 5: timeout atomicity under heavy contention. Many `acquire(true,
/// Some(Duration::ZERO))` attempts on a writer guard while readers and
/// writers are active elsewhere; every attempt either succeeds cleanly or
/// fails cleanly, and the lock never ends up in a state where a failed
/// attempt altered counters.
#[test]
fn timeout_attempts_never_leak_state_under_contention() {
    let lock = Arc::new(WritePreferringLock::<StdBinaryMutex>::new());

    let contenders: Vec<_> = (0..4)
        .map(|_| {
            let lock = lock.clone();
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..200 {
                    let reader = lock.reader_guard();
                    if reader.acquire(true, Some(Duration::from_millis(rng.gen_range(1..5)))) {
                        thread::sleep(Duration::from_micros(rng.gen_range(50..200)));
                        reader.release().unwrap();
                    }
                }
            })
        })
        .collect();

    let probe_lock = lock.clone();
    let mut successes = 0usize;
    let mut failures = 0usize;
    for _ in 0..2000 {
        let writer = probe_lock.writer_guard();
        if writer.acquire(true, Some(Duration::ZERO)) {
            successes += 1;
            writer.release().unwrap();
        } else {
            failures += 1;
            // A failed attempt must not leave the guard looking locked.
            assert!(!writer.locked());
        }
    }

    for handle in contenders {
        handle.join().unwrap();
    }

    assert!(successes + failures == 2000);

    // The lock must still be fully usable afterwards.
    let writer = lock.writer_guard();
    assert!(writer.acquire(true, None));
    writer.release().unwrap();
}

/// Scenario 6: scoped acquisition releases even when the scope unwinds
/// through a panic, and the lock returns to its prior state.
#[test]
fn scoped_reader_releases_through_a_panic() {
    let lock = Arc::new(ReadPreferringLock::<StdBinaryMutex>::new());
    let reader = lock.reader_guard();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _scope = reader.scoped().unwrap();
        assert!(reader.locked());
        panic!("boom");
    }));

    assert!(result.is_err());
    assert!(!reader.locked());

    // The lock itself is unaffected: a fresh acquire still succeeds.
    let other_reader = lock.reader_guard();
    assert!(other_reader.acquire(true, None));
    other_reader.release().unwrap();
}

/// Calling `scoped()` on a guard that is already holding an acquisition must
/// not construct an adapter that would release the in-progress acquisition
/// out from under its caller.
#[test]
fn scoped_on_an_already_locked_guard_does_not_release_the_prior_acquisition() {
    let lock = ReadPreferringLock::<StdBinaryMutex>::new();
    let reader = lock.reader_guard();
    assert!(reader.acquire(true, None));

    assert!(reader.scoped().is_none());
    assert!(reader.locked());

    reader.release().unwrap();
}

/// Idempotent release error: releasing a guard that was never successfully
/// acquired is a usage error, and repeats are consistent.
#[test]
fn release_without_acquire_is_a_usage_error_on_every_variant() {
    let read_preferring = ReadPreferringLock::<StdBinaryMutex>::new();
    let reader = read_preferring.reader_guard();
    assert_eq!(reader.release(), Err(LockError::NotLocked));
    assert_eq!(reader.release(), Err(LockError::NotLocked));

    let write_preferring = WritePreferringLock::<StdBinaryMutex>::new();
    let writer = write_preferring.writer_guard();
    assert_eq!(writer.release(), Err(LockError::NotLocked));

    let fair = FairLock::<StdBinaryMutex>::new();
    let reader = fair.reader_guard();
    assert!(reader.acquire(true, None));
    reader.release().unwrap();
    assert_eq!(reader.release(), Err(LockError::NotLocked));
}

/// Mutual exclusion holds across all three variants: no writer is ever
/// concurrently `locked()` alongside any other guard also `locked()`.
#[test]
fn mutual_exclusion_across_variants() {
    let lock = Arc::new(WritePreferringLock::<StdBinaryMutex>::new());
    let active = Arc::new(AtomicUsize::new(0));
    let violations = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let lock = lock.clone();
            let active = active.clone();
            let violations = violations.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    if i % 2 == 0 {
                        let writer = lock.writer_guard();
                        if writer.acquire(true, Some(Duration::from_millis(20))) {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            if now != 1 {
                                violations.fetch_add(1, Ordering::SeqCst);
                            }
                            thread::sleep(Duration::from_micros(100));
                            active.fetch_sub(1, Ordering::SeqCst);
                            writer.release().unwrap();
                        }
                    } else {
                        let reader = lock.reader_guard();
                        if reader.acquire(true, Some(Duration::from_millis(20))) {
                            thread::sleep(Duration::from_micros(50));
                            reader.release().unwrap();
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(violations.load(Ordering::SeqCst), 0);
}
