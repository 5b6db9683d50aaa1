//! Disjunctive interval composition
//!
//! A disjunction reports the intervals of every matching child, merged into
//! one stream ordered by ascending start (ties by ascending end). Each
//! reported interval keeps the gaps of the child it came from. Every child
//! interval is emitted, including those enclosing a tighter sibling match.

use crate::intervals::disi::DocIdDisjunction;
use crate::intervals::iterator::{IntervalIterator, NO_MORE_DOCS, NO_MORE_INTERVALS};
use crate::intervals::matches::MatchesIterator;
use crate::intervals::source::IntervalsSource;
use crate::Result;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry popped in ascending-start order, ties by ascending end
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DisjunctionEntry {
    start: u32,
    end: u32,
    gaps: u32,
    idx: usize,
}

impl Ord for DisjunctionEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .start
            .cmp(&self.start)
            .then(other.end.cmp(&self.end))
            .then(other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for DisjunctionEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) struct DisjunctionIntervalIterator {
    subs: Vec<Box<dyn IntervalIterator>>,
    driver: DocIdDisjunction,
    queue: BinaryHeap<DisjunctionEntry>,
    current: Option<DisjunctionEntry>,
    cost: u64,
    match_cost: f32,
}

impl DisjunctionIntervalIterator {
    pub fn new(subs: Vec<Box<dyn IntervalIterator>>) -> Self {
        debug_assert!(!subs.is_empty());
        let cost = subs.iter().map(|s| s.cost()).sum();
        let match_cost = subs.iter().map(|s| s.match_cost()).sum();
        let driver = DocIdDisjunction::new(subs.len());
        Self {
            subs,
            driver,
            queue: BinaryHeap::new(),
            current: None,
            cost,
            match_cost,
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.queue.clear();
        self.current = None;
        for idx in self.driver.current_subs() {
            if self.subs[idx].next_interval()? != NO_MORE_INTERVALS {
                self.push_queue(idx);
            }
        }
        Ok(())
    }

    fn push_queue(&mut self, idx: usize) {
        self.queue.push(DisjunctionEntry {
            start: self.subs[idx].start(),
            end: self.subs[idx].end(),
            gaps: self.subs[idx].gaps(),
            idx,
        });
    }
}

impl IntervalIterator for DisjunctionIntervalIterator {
    fn start(&self) -> u32 {
        self.current.map(|e| e.start).unwrap_or(NO_MORE_INTERVALS)
    }

    fn end(&self) -> u32 {
        self.current.map(|e| e.end).unwrap_or(NO_MORE_INTERVALS)
    }

    fn gaps(&self) -> u32 {
        self.current.map(|e| e.gaps).unwrap_or(0)
    }

    fn next_interval(&mut self) -> Result<u32> {
        match self.queue.pop() {
            None => {
                self.current = None;
                Ok(NO_MORE_INTERVALS)
            }
            Some(entry) => {
                // refill eagerly so the queue always holds each live sub's
                // next interval
                if self.subs[entry.idx].next_interval()? != NO_MORE_INTERVALS {
                    self.push_queue(entry.idx);
                }
                self.current = Some(entry);
                Ok(entry.start)
            }
        }
    }

    fn doc_id(&self) -> u32 {
        self.driver.doc_id()
    }

    fn next_doc(&mut self) -> Result<u32> {
        let doc = self.driver.next_doc(&mut self.subs)?;
        if doc != NO_MORE_DOCS {
            self.reset()?;
        }
        Ok(doc)
    }

    fn advance(&mut self, target: u32) -> Result<u32> {
        let before = self.driver.doc_id();
        let doc = self.driver.advance(target, &mut self.subs)?;
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

#[derive(Clone, Copy, Debug)]
enum SubState {
    // needs a next() call before it can compete
    Fresh,
    Loaded { start: u32, end: u32 },
    Exhausted,
}

/// Matches iterator merging every matching child's matches by position
pub(crate) struct DisjunctionMatchesIterator {
    subs: Vec<Box<dyn MatchesIterator>>,
    states: Vec<SubState>,
    current: Option<usize>,
}

impl DisjunctionMatchesIterator {
    pub fn new(subs: Vec<Box<dyn MatchesIterator>>) -> Self {
        let states = vec![SubState::Fresh; subs.len()];
        Self {
            subs,
            states,
            current: None,
        }
    }

    fn current_sub(&self) -> &dyn MatchesIterator {
        let idx = self.current.expect("matches iterator queried before next()");
        self.subs[idx].as_ref()
    }
}

impl MatchesIterator for DisjunctionMatchesIterator {
    fn next(&mut self) -> Result<bool> {
        if let Some(cur) = self.current.take() {
            self.states[cur] = SubState::Fresh;
        }
        for i in 0..self.subs.len() {
            if matches!(self.states[i], SubState::Fresh) {
                self.states[i] = if self.subs[i].next()? {
                    SubState::Loaded {
                        start: self.subs[i].start_position(),
                        end: self.subs[i].end_position(),
                    }
                } else {
                    SubState::Exhausted
                };
            }
        }
        let mut best: Option<(u32, u32, usize)> = None;
        for (i, state) in self.states.iter().enumerate() {
            if let SubState::Loaded { start, end } = state {
                let key = (*start, *end, i);
                if best.map_or(true, |b| key < b) {
                    best = Some(key);
                }
            }
        }
        match best {
            Some((_, _, idx)) => {
                self.current = Some(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn start_position(&self) -> u32 {
        self.current_sub().start_position()
    }

    fn end_position(&self) -> u32 {
        self.current_sub().end_position()
    }

    fn start_offset(&self) -> Result<u32> {
        self.current_sub().start_offset()
    }

    fn end_offset(&self) -> Result<u32> {
        self.current_sub().end_offset()
    }

    fn gaps(&self) -> u32 {
        self.current_sub().gaps()
    }

    fn width(&self) -> u32 {
        self.current_sub().width()
    }

    fn sub_matches(&mut self) -> Result<Option<Box<dyn MatchesIterator>>> {
        let idx = self.current.expect("matches iterator queried before next()");
        self.subs[idx].sub_matches()
    }

    fn source(&self) -> Option<IntervalsSource> {
        self.current_sub().source()
    }
}
