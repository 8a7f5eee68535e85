//! Bounded frame history.
//!
//! [`HistoryBuffer`] keeps the masks and merged runs of the most recent
//! frames in a fixed-capacity ring.  Storage is allocated once at
//! construction; when the ring is full the oldest slot is overwritten in
//! place, so eviction is O(1).
//!
//! # Example
//!
//! ```
//! use occlusion_core::{HistoryBuffer, Run};
//!
//! let mut history = HistoryBuffer::new(2);
//! history.push(vec![true], vec![Run::new(0, 0)]);
//! history.push(vec![false], vec![]);
//! history.push(vec![true], vec![Run::new(0, 0)]);
//!
//! // Only the two newest frames remain, oldest first.
//! let kept: Vec<usize> = history.snapshot().map(|e| e.runs.len()).collect();
//! assert_eq!(kept, vec![0, 1]);
//! ```

use occlusion_types::Run;

/// One past frame: its invalid-beam mask and the runs that survived merging.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub mask: Vec<bool>,
    pub runs: Vec<Run>,
}

/// How far the ring has filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillLevel {
    /// No frame recorded yet; every run scores zero stability.
    Empty,
    /// Some frames recorded but fewer than the capacity.
    Filling,
    /// Full; each push now evicts the oldest frame.
    Steady,
}

/// Fixed-capacity ring buffer of [`HistoryEntry`] values.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: Vec<HistoryEntry>,
    capacity: usize,
    /// Slot holding the oldest entry once the ring is full.
    head: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` frames.
    ///
    /// A zero capacity is raised to one; detector configurations reject it
    /// before this point.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Append a frame, evicting the oldest one when at capacity.
    pub fn push(&mut self, mask: Vec<bool>, runs: Vec<Run>) {
        let entry = HistoryEntry { mask, runs };
        if self.slots.len() < self.capacity {
            self.slots.push(entry);
        } else {
            self.slots[self.head] = entry;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Entries in insertion order, oldest first.
    pub fn snapshot(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// The most recently pushed entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        if self.slots.is_empty() {
            None
        } else if self.slots.len() < self.capacity {
            self.slots.last()
        } else {
            let idx = (self.head + self.capacity - 1) % self.capacity;
            self.slots.get(idx)
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn fill_level(&self) -> FillLevel {
        match self.slots.len() {
            0 => FillLevel::Empty,
            n if n < self.capacity => FillLevel::Filling,
            _ => FillLevel::Steady,
        }
    }

    /// Forget every recorded frame.  The capacity is unchanged.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tag: usize) -> (Vec<bool>, Vec<Run>) {
        (vec![true; tag + 1], vec![Run::new(tag, tag)])
    }

    fn tags(h: &HistoryBuffer) -> Vec<usize> {
        h.snapshot().map(|e| e.runs[0].start).collect()
    }

    #[test]
    fn starts_empty() {
        let h = HistoryBuffer::new(3);
        assert!(h.is_empty());
        assert_eq!(h.fill_level(), FillLevel::Empty);
        assert_eq!(h.snapshot().count(), 0);
        assert!(h.latest().is_none());
    }

    #[test]
    fn fills_in_insertion_order() {
        let mut h = HistoryBuffer::new(3);
        for t in 0..2 {
            let (m, r) = tagged(t);
            h.push(m, r);
        }
        assert_eq!(h.fill_level(), FillLevel::Filling);
        assert_eq!(tags(&h), vec![0, 1]);
        assert_eq!(h.latest().map(|e| e.runs[0].start), Some(1));
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut h = HistoryBuffer::new(3);
        for t in 0..5 {
            let (m, r) = tagged(t);
            h.push(m, r);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.fill_level(), FillLevel::Steady);
        assert_eq!(tags(&h), vec![2, 3, 4]);
        assert_eq!(h.latest().map(|e| e.runs[0].start), Some(4));
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut h = HistoryBuffer::new(4);
        for t in 0..50 {
            let (m, r) = tagged(t);
            h.push(m, r);
            assert!(h.len() <= 4);
        }
        assert_eq!(tags(&h), vec![46, 47, 48, 49]);
    }

    #[test]
    fn capacity_one_keeps_only_latest() {
        let mut h = HistoryBuffer::new(1);
        for t in 0..3 {
            let (m, r) = tagged(t);
            h.push(m, r);
        }
        assert_eq!(tags(&h), vec![2]);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let mut h = HistoryBuffer::new(2);
        let (m, r) = tagged(7);
        h.push(m, r);
        let _ = h.snapshot().count();
        let _ = h.snapshot().count();
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn clear_resets_but_keeps_capacity() {
        let mut h = HistoryBuffer::new(2);
        for t in 0..3 {
            let (m, r) = tagged(t);
            h.push(m, r);
        }
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.capacity(), 2);
        let (m, r) = tagged(9);
        h.push(m, r);
        assert_eq!(tags(&h), vec![9]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        assert_eq!(HistoryBuffer::new(0).capacity(), 1);
    }
}
