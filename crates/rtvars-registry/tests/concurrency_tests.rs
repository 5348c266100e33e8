//! Concurrency tests: one writer, many readers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use rtvars_registry::prelude::*;

#[test]
fn test_readers_only_see_admitted_values() -> Result<(), Box<dyn std::error::Error>> {
    let mut root = Registry::new("root")?;
    let v = root.register_variable("x", VariableKind::Double, Some(Bounds::new(0.0, 1.0)))?;
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let v = Arc::clone(&v);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0u64;
                while !done.load(Ordering::Acquire) {
                    let value = v.value_as_f64();
                    assert!((0.0..=1.0).contains(&value), "torn or unclamped value {value}");
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    for i in 0..20_000u32 {
        v.set_double(f64::from(i % 7) - 3.0)?;
    }
    done.store(true, Ordering::Release);

    for handle in readers {
        assert!(handle.join().is_ok(), "reader thread panicked unexpectedly");
    }
    Ok(())
}

#[test]
fn test_listener_added_from_other_thread() -> Result<(), Box<dyn std::error::Error>> {
    let mut root = Registry::new("root")?;
    let v = root.register_variable("count", VariableKind::Long, None)?;
    let total = Arc::new(std::sync::atomic::AtomicI64::new(0));

    let adder = {
        let v = Arc::clone(&v);
        let total = Arc::clone(&total);
        thread::spawn(move || {
            v.add_listener(move |var| {
                total.fetch_add(var.get_long().unwrap_or_default(), Ordering::SeqCst);
            })
        })
    };
    let handle = adder.join().map_err(|_panic| "listener thread panicked")??;

    for n in 1..=10 {
        v.set_long(n)?;
    }
    assert_eq!(total.load(Ordering::SeqCst), 55);
    v.remove_listener(handle)?;
    Ok(())
}
