//! Change-listener table.
//!
//! Listeners live in a slot arena threaded by a doubly linked list in
//! registration order. Freed slots go on a free list and are reused, so the
//! arena never holds more slots than the peak number of live listeners and
//! notification only visits live entries.
//!
//! A [`ListenerHandle`] carries the slot index and the slot's generation at
//! insertion. Reusing a slot bumps its generation, so a stale handle never
//! removes a newer listener.

use core::fmt;

use crate::variable::Variable;

/// Callback invoked synchronously after every successful write.
pub type Listener = Box<dyn Fn(&Variable) + Send + Sync>;

/// Handle returned by [`Variable::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    pub(crate) owner: u64,
    pub(crate) key: SlotKey,
}

impl ListenerHandle {
    /// Id of the variable this handle belongs to.
    pub fn owner(&self) -> u64 {
        self.owner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotKey {
    index: usize,
    generation: u32,
}

struct Slot {
    generation: u32,
    listener: Option<Listener>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
pub(crate) struct ListenerTable {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    live: usize,
}

impl ListenerTable {
    pub(crate) fn insert(&mut self, listener: Listener) -> SlotKey {
        let prev = self.tail;
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    listener: None,
                    prev: None,
                    next: None,
                });
                self.slots.len() - 1
            }
        };
        let generation = match self.slots.get_mut(index) {
            Some(slot) => {
                slot.listener = Some(listener);
                slot.prev = prev;
                slot.next = None;
                slot.generation
            }
            None => 0,
        };
        match prev.and_then(|p| self.slots.get_mut(p)) {
            Some(last) => last.next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.live += 1;
        SlotKey { index, generation }
    }

    pub(crate) fn remove(&mut self, key: SlotKey) -> bool {
        let Some(slot) = self.slots.get_mut(key.index) else {
            return false;
        };
        if slot.generation != key.generation || slot.listener.is_none() {
            return false;
        }
        slot.listener = None;
        slot.generation = slot.generation.wrapping_add(1);
        let (prev, next) = (slot.prev.take(), slot.next.take());

        match prev.and_then(|p| self.slots.get_mut(p)) {
            Some(before) => before.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.slots.get_mut(n)) {
            Some(after) => after.prev = prev,
            None => self.tail = prev,
        }
        self.free.push(key.index);
        self.live -= 1;
        true
    }

    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Allocated slots, live or free.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Live listeners in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Listener> {
        core::iter::successors(self.head.and_then(|i| self.slots.get(i)), |slot| {
            slot.next.and_then(|i| self.slots.get(i))
        })
        .filter_map(|slot| slot.listener.as_ref())
    }
}

impl fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerTable")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field("live", &self.live)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> Listener {
        Box::new(|_: &Variable| {})
    }

    /// Listener that records `tag` into `log` when called.
    fn tagged(log: &Arc<parking_lot::Mutex<Vec<u8>>>, tag: u8) -> Listener {
        let log = Arc::clone(log);
        Box::new(move |_: &Variable| log.lock().push(tag))
    }

    fn call_all(table: &ListenerTable) -> Result<(), Box<dyn std::error::Error>> {
        let mut root = crate::Registry::new("root")?;
        let x = root.register_variable("x", crate::VariableKind::Double, None)?;
        for listener in table.iter() {
            listener(&x);
        }
        Ok(())
    }

    #[test]
    fn test_insert_assigns_distinct_slots() {
        let mut table = ListenerTable::default();
        let a = table.insert(noop());
        let b = table.insert(noop());
        assert_ne!(a, b);
        assert_eq!(table.live(), 2);
    }

    #[test]
    fn test_remove_keeps_other_slots() {
        let mut table = ListenerTable::default();
        let a = table.insert(noop());
        let b = table.insert(noop());
        assert!(table.remove(a));
        assert!(!table.remove(a));
        assert_eq!(table.live(), 1);
        assert_eq!(table.iter().count(), 1);
        assert!(table.remove(b));
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn test_reused_slot_rejects_stale_key() {
        let mut table = ListenerTable::default();
        let a = table.insert(noop());
        assert!(table.remove(a));
        let b = table.insert(noop());
        assert_eq!(table.slot_count(), 1);
        assert_ne!(a, b);
        assert!(!table.remove(a));
        assert_eq!(table.live(), 1);
        assert!(table.remove(b));
    }

    #[test]
    fn test_churn_beside_long_lived_listener_stays_bounded() {
        let mut table = ListenerTable::default();
        let _kept = table.insert(noop());
        for _ in 0..100_000 {
            let key = table.insert(noop());
            assert!(table.remove(key));
        }
        assert_eq!(table.live(), 1);
        assert_eq!(table.slot_count(), 2);
        assert_eq!(table.iter().count(), 1);
    }

    #[test]
    fn test_order_follows_registration_after_reuse() -> Result<(), Box<dyn std::error::Error>> {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut table = ListenerTable::default();
        let first = table.insert(tagged(&log, 1));
        let _second = table.insert(tagged(&log, 2));
        let middle = table.insert(tagged(&log, 3));
        let _fourth = table.insert(tagged(&log, 4));
        assert!(table.remove(first));
        assert!(table.remove(middle));
        // Reuses a freed slot but must run last.
        let _fifth = table.insert(tagged(&log, 5));
        assert_eq!(table.slot_count(), 4);

        call_all(&table)?;
        assert_eq!(*log.lock(), [2, 4, 5]);
        Ok(())
    }

    #[test]
    fn test_iter_visits_only_live_entries() -> Result<(), Box<dyn std::error::Error>> {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut table = ListenerTable::default();
        let keys: Vec<SlotKey> = (0..8)
            .map(|_| {
                let calls = Arc::clone(&calls);
                table.insert(Box::new(move |_: &Variable| {
                    calls.fetch_add(1, Ordering::Relaxed);
                }))
            })
            .collect();
        for key in keys.iter().step_by(2) {
            assert!(table.remove(*key));
        }
        call_all(&table)?;
        assert_eq!(calls.load(Ordering::Relaxed), 4);
        Ok(())
    }
}
