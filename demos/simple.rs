//! Demonstrates protecting an external counter with `WritePreferringLock`.
//!
//! Unlike `std::sync::RwLock`, the locks in this crate do not own the data
//! they protect — a guard only tells you whether you may touch the
//! resource, so the resource itself (here, a plain `UnsafeCell<i32>`) is
//! kept alongside the lock and accessed only between `acquire`/`release`.

use std::cell::UnsafeCell;
use std::sync::Arc;
use std::thread;

use rwsched::WritePreferringLock;

struct Counter {
    lock: WritePreferringLock,
    value: UnsafeCell<i32>,
}

unsafe impl Sync for Counter {}

fn main() {
    let counter = Arc::new(Counter {
        lock: WritePreferringLock::new(),
        value: UnsafeCell::new(0),
    });

    let writer = {
        let counter = counter.clone();
        thread::spawn(move || {
            let guard = counter.lock.writer_guard();
            for _ in 0..1000 {
                assert!(guard.acquire(true, None));
                unsafe {
                    *counter.value.get() += 1;
                }
                guard.release().unwrap();
            }
        })
    };

    let reader = counter.lock.reader_guard();
    for _ in 0..1000 {
        assert!(reader.acquire(true, None));
        let seen = unsafe { *counter.value.get() };
        reader.release().unwrap();
        println!("read {seen}");
    }

    writer.join().unwrap();

    let final_guard = counter.lock.reader_guard();
    assert!(final_guard.acquire(true, None));
    assert_eq!(unsafe { *counter.value.get() }, 1000);
    final_guard.release().unwrap();
}
