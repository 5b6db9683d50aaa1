//! Heap orderings for interval rotation
//!
//! The combinators rotate sub-iterators through `BinaryHeap`s under two
//! comparator configurations: ascending start (ties by descending end) for
//! candidate-window membership, and ascending end (ties by descending start)
//! for the background pool. Entries snapshot the iterator's current
//! `(start, end)` at push time together with its stable index; this is sound
//! because an iterator is only ever advanced after its entry has been popped.

use std::cmp::Ordering;

/// Heap entry popped in ascending-start order, ties broken by descending end
///
/// This is the proximity-queue ordering: the top is the leftmost member of
/// the current candidate window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StartQueueEntry {
    pub start: u32,
    pub end: u32,
    pub idx: usize,
}

impl Ord for StartQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: "greatest" must be the entry we want out
        // first, i.e. the smallest start.
        other
            .start
            .cmp(&self.start)
            .then(self.end.cmp(&other.end))
            .then(other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for StartQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Heap entry popped in ascending-end order, ties broken by descending start
///
/// This is the background-queue ordering: the top is the sub-iterator whose
/// current interval finishes soonest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EndQueueEntry {
    pub start: u32,
    pub end: u32,
    pub idx: usize,
}

impl Ord for EndQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .end
            .cmp(&self.end)
            .then(self.start.cmp(&other.start))
            .then(other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for EndQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn test_start_queue_pops_ascending_start() {
        let mut heap = BinaryHeap::new();
        for (i, (s, e)) in [(5, 6), (0, 9), (3, 3)].iter().enumerate() {
            heap.push(StartQueueEntry {
                start: *s,
                end: *e,
                idx: i,
            });
        }
        let starts: Vec<u32> = std::iter::from_fn(|| heap.pop()).map(|e| e.start).collect();
        assert_eq!(starts, vec![0, 3, 5]);
    }

    #[test]
    fn test_start_queue_ties_break_by_descending_end() {
        let mut heap = BinaryHeap::new();
        heap.push(StartQueueEntry {
            start: 2,
            end: 4,
            idx: 0,
        });
        heap.push(StartQueueEntry {
            start: 2,
            end: 8,
            idx: 1,
        });
        assert_eq!(heap.pop().unwrap().end, 8);
        assert_eq!(heap.pop().unwrap().end, 4);
    }

    #[test]
    fn test_end_queue_pops_ascending_end() {
        let mut heap = BinaryHeap::new();
        for (i, (s, e)) in [(0, 9), (1, 2), (4, 7)].iter().enumerate() {
            heap.push(EndQueueEntry {
                start: *s,
                end: *e,
                idx: i,
            });
        }
        let ends: Vec<u32> = std::iter::from_fn(|| heap.pop()).map(|e| e.end).collect();
        assert_eq!(ends, vec![2, 7, 9]);
    }

    #[test]
    fn test_end_queue_ties_break_by_descending_start() {
        let mut heap = BinaryHeap::new();
        heap.push(EndQueueEntry {
            start: 1,
            end: 5,
            idx: 0,
        });
        heap.push(EndQueueEntry {
            start: 3,
            end: 5,
            idx: 1,
        });
        assert_eq!(heap.pop().unwrap().start, 3);
        assert_eq!(heap.pop().unwrap().start, 1);
    }
}
