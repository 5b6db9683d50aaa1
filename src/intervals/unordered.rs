//! Unordered (near-like) interval composition
//!
//! An unordered interval is the smallest window containing one interval from
//! every sub-iterator, in any order. All subs rotate through a single
//! ascending-start queue; the window end is a running maximum over every
//! interval seen on the current document, and minimization advances the
//! leftmost sub while the window end stands still.

use crate::intervals::disi::{conjunction_advance, conjunction_next_doc};
use crate::intervals::iterator::{IntervalIterator, NO_MORE_DOCS, NO_MORE_INTERVALS};
use crate::intervals::queue::StartQueueEntry;
use crate::Result;
use std::collections::BinaryHeap;

pub(crate) struct UnorderedIntervalIterator {
    subs: Vec<Box<dyn IntervalIterator>>,
    queue: BinaryHeap<StartQueueEntry>,
    start: u32,
    end: u32,
    queue_end: u32,
    slop: u32,
    cost: u64,
    match_cost: f32,
}

impl UnorderedIntervalIterator {
    pub fn new(subs: Vec<Box<dyn IntervalIterator>>) -> Self {
        debug_assert!(!subs.is_empty());
        let cost = subs.iter().map(|s| s.cost()).min().unwrap_or(0);
        let match_cost = subs.iter().map(|s| s.match_cost()).sum();
        Self {
            subs,
            queue: BinaryHeap::new(),
            start: NO_MORE_INTERVALS,
            end: NO_MORE_INTERVALS,
            queue_end: 0,
            slop: 0,
            cost,
            match_cost,
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.queue.clear();
        self.queue_end = 0;
        self.start = NO_MORE_INTERVALS;
        self.end = NO_MORE_INTERVALS;
        self.slop = 0;
        for idx in 0..self.subs.len() {
            if self.subs[idx].next_interval()? != NO_MORE_INTERVALS {
                self.push_queue(idx);
            }
        }
        Ok(())
    }

    fn push_queue(&mut self, idx: usize) {
        let start = self.subs[idx].start();
        let end = self.subs[idx].end();
        self.queue_end = self.queue_end.max(end);
        self.queue.push(StartQueueEntry { start, end, idx });
    }

    fn rotate(&mut self, idx: usize) -> Result<()> {
        if self.subs[idx].next_interval()? != NO_MORE_INTERVALS {
            self.push_queue(idx);
        }
        Ok(())
    }

    fn update_slop(&mut self) {
        // overlapping subs can cover more positions than the window holds
        let covered: u32 = self.queue.iter().map(|e| e.end - e.start + 1).sum();
        self.slop = self.width().saturating_sub(covered);
    }
}

impl IntervalIterator for UnorderedIntervalIterator {
    fn start(&self) -> u32 {
        self.start
    }

    fn end(&self) -> u32 {
        self.end
    }

    fn gaps(&self) -> u32 {
        self.slop
    }

    fn next_interval(&mut self) -> Result<u32> {
        let n = self.subs.len();
        // discard members still starting at the previous window's start
        while self.queue.len() == n {
            let idx = match self.queue.peek() {
                Some(e) if e.start == self.start => e.idx,
                _ => break,
            };
            self.queue.pop();
            self.rotate(idx)?;
        }
        if self.queue.len() < n {
            self.start = NO_MORE_INTERVALS;
            self.end = NO_MORE_INTERVALS;
            return Ok(NO_MORE_INTERVALS);
        }
        // minimize: advance the leftmost sub while the window end holds
        loop {
            let top = *self.queue.peek().expect("queue holds every sub");
            self.start = top.start;
            self.end = self.queue_end;
            self.update_slop();
            if top.end == self.end {
                return Ok(self.start);
            }
            self.queue.pop();
            self.rotate(top.idx)?;
            if self.queue.len() != n || self.end != self.queue_end {
                return Ok(self.start);
            }
        }
    }

    fn doc_id(&self) -> u32 {
        self.subs[0].doc_id()
    }

    fn next_doc(&mut self) -> Result<u32> {
        let doc = conjunction_next_doc(&mut self.subs)?;
        if doc != NO_MORE_DOCS {
            self.reset()?;
        }
        Ok(doc)
    }

    fn advance(&mut self, target: u32) -> Result<u32> {
        let before = self.subs[0].doc_id();
        let doc = conjunction_advance(&mut self.subs, target)?;
        if doc != NO_MORE_DOCS && doc != before {
            self.reset()?;
        }
        Ok(doc)
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn match_cost(&self) -> f32 {
        self.match_cost
    }
}
