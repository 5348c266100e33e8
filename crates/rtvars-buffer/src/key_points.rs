//! Bookmarked ticks.

use std::collections::BTreeSet;

/// Sorted set of bookmarked tick numbers.
///
/// Lives beside the writer, off the tick path. Queries take the current
/// out point so bookmarks on overwritten rows are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPoints {
    ticks: BTreeSet<u64>,
}

impl KeyPoints {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the bookmark on `tick`; returns true if it is now set.
    pub fn toggle(&mut self, tick: u64) -> bool {
        if self.ticks.remove(&tick) {
            false
        } else {
            self.ticks.insert(tick);
            true
        }
    }

    /// True if `tick` is bookmarked and still retained.
    pub fn contains(&self, tick: u64, out_point: u64) -> bool {
        tick >= out_point && self.ticks.contains(&tick)
    }

    /// First bookmark strictly after `tick`.
    pub fn next_after(&self, tick: u64, out_point: u64) -> Option<u64> {
        let from = tick.saturating_add(1).max(out_point);
        self.ticks.range(from..).next().copied()
    }

    /// Last retained bookmark strictly before `tick`.
    pub fn previous_before(&self, tick: u64, out_point: u64) -> Option<u64> {
        if tick <= out_point {
            return None;
        }
        self.ticks
            .range(out_point..tick)
            .next_back()
            .copied()
    }

    /// Retained bookmarks in ascending order.
    pub fn iter(&self, out_point: u64) -> impl Iterator<Item = u64> + '_ {
        self.ticks.range(out_point..).copied()
    }

    /// Forget bookmarks older than `out_point`.
    pub fn prune(&mut self, out_point: u64) {
        self.ticks = self.ticks.split_off(&out_point);
    }

    /// Forget every bookmark.
    pub fn clear(&mut self) {
        self.ticks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut kp = KeyPoints::new();
        assert!(kp.toggle(5));
        assert!(kp.contains(5, 0));
        assert!(!kp.toggle(5));
        assert!(!kp.contains(5, 0));
    }

    #[test]
    fn test_navigation_skips_evicted() {
        let mut kp = KeyPoints::new();
        for t in [2, 6, 9] {
            kp.toggle(t);
        }
        assert_eq!(kp.next_after(2, 0), Some(6));
        assert_eq!(kp.next_after(9, 0), None);
        assert_eq!(kp.previous_before(9, 0), Some(6));
        assert_eq!(kp.previous_before(6, 3), None);
        assert_eq!(kp.next_after(0, 3), Some(6));
        assert_eq!(kp.iter(3).collect::<Vec<_>>(), [6, 9]);
    }

    #[test]
    fn test_prune() {
        let mut kp = KeyPoints::new();
        for t in [1, 4, 8] {
            kp.toggle(t);
        }
        kp.prune(4);
        assert_eq!(kp.iter(0).collect::<Vec<_>>(), [4, 8]);
    }
}
