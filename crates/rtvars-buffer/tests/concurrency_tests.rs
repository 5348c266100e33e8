//! Concurrent readers against a ticking writer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use rtvars_buffer::prelude::*;
use rtvars_registry::prelude::*;

#[test]
fn test_readers_never_see_torn_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut root = Registry::new("root")?;
    let a = root.register_variable("a", VariableKind::Long, None)?;
    let b = root.register_variable("b", VariableKind::Long, None)?;
    let mut buffer = HistoryBuffer::new();
    buffer.configure(vec![Arc::clone(&a), Arc::clone(&b)], 64)?;
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let reader = buffer.reader();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let Ok(window) = reader.read_window(0, 64) else {
                        continue;
                    };
                    for (tick, row) in window.rows() {
                        let expected = i64::try_from(tick).unwrap_or(i64::MAX);
                        assert_eq!(
                            row,
                            vec![VariableValue::Long(expected), VariableValue::Long(-expected)],
                            "row for tick {tick} is inconsistent"
                        );
                    }
                }
            })
        })
        .collect();

    for tick in 0..50_000i64 {
        a.set_long(tick)?;
        b.set_long(-tick)?;
        buffer.tick()?;
    }
    done.store(true, Ordering::Release);

    for handle in readers {
        assert!(handle.join().is_ok(), "reader thread panicked unexpectedly");
    }
    assert_eq!(buffer.counters().snapshot().ticks_written, 50_000);
    Ok(())
}

#[test]
fn test_reader_follows_reconfigure() -> Result<(), Box<dyn std::error::Error>> {
    let mut root = Registry::new("root")?;
    let x = root.register_variable("x", VariableKind::Integer, None)?;
    let mut buffer = HistoryBuffer::new();
    buffer.configure(vec![Arc::clone(&x)], 8)?;
    let reader = buffer.reader();

    let observer = thread::spawn(move || {
        let mut seen = 0usize;
        while seen < 1000 {
            let capacity = reader.capacity();
            assert!(capacity == 8 || capacity == 32, "unexpected capacity {capacity}");
            seen += 1;
        }
    });

    for v in 0..100 {
        x.set_integer(v)?;
        buffer.tick()?;
    }
    buffer.reconfigure(32)?;
    assert!(observer.join().is_ok(), "observer thread panicked unexpectedly");
    assert_eq!(buffer.reader().len(), 8);
    Ok(())
}
