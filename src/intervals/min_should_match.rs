//! "At least k of n" proximity assembly
//!
//! The combinator maintains two heaps over its sub-iterators: a proximity
//! queue holding exactly `min_should_match` members of the current candidate
//! window, ordered by ascending start, and a background pool of the rest,
//! ordered by ascending end. The window end is a running maximum over every
//! interval that has entered the proximity queue on this document; each step
//! either returns the current window or advances its leftmost member to try
//! to tighten it. Matches mode replays the same algorithm over caching
//! per-sub shims so offsets and sub-matches stay answerable.

use crate::intervals::context::SearchContext;
use crate::intervals::disi::DocIdDisjunction;
use crate::intervals::iterator::{IntervalIterator, NO_MORE_DOCS, NO_MORE_INTERVALS};
use crate::intervals::matches::{
    disjoin_sub_matches, CachingMatchesIterator, MatchesIntervalAdapter, MatchesIterator,
};
use crate::intervals::queue::{EndQueueEntry, StartQueueEntry};
use crate::intervals::source::IntervalsSource;
use crate::Result;
use std::cell::RefCell;
use std::collections::BinaryHeap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Interval iterator over windows containing at least `min_should_match`
/// sub-intervals
pub(crate) struct MinimumShouldMatchIntervalIterator {
    subs: Vec<Box<dyn IntervalIterator>>,
    driver: DocIdDisjunction,
    proximity: BinaryHeap<StartQueueEntry>,
    background: BinaryHeap<EndQueueEntry>,
    min_should_match: usize,
    start: u32,
    end: u32,
    // running max over every end that has entered the proximity queue on
    // the current document; never shrinks within a document
    queue_end: u32,
    slop: u32,
    // the member advanced out of the current window during minimization
    lead: Option<usize>,
    cost: u64,
    match_cost: f32,
}

impl MinimumShouldMatchIntervalIterator {
    pub fn new(subs: Vec<Box<dyn IntervalIterator>>, min_should_match: u32) -> Self {
        debug_assert!(subs.len() >= min_should_match as usize);
        let cost = subs.iter().map(|s| s.cost()).sum();
        let match_cost = subs.iter().map(|s| s.match_cost()).sum();
        let driver = DocIdDisjunction::new(subs.len());
        Self {
            subs,
            driver,
            proximity: BinaryHeap::new(),
            background: BinaryHeap::new(),
            min_should_match: min_should_match as usize,
            start: NO_MORE_INTERVALS,
            end: NO_MORE_INTERVALS,
            queue_end: 0,
            slop: 0,
            lead: None,
            cost,
            match_cost,
        }
    }

    /// Indices of the subs inside the current window: the advanced lead plus
    /// every proximity member whose interval ends within it
    pub fn current_iterators(&self) -> Vec<usize> {
        let mut members = Vec::with_capacity(self.min_should_match + 1);
        if let Some(lead) = self.lead {
            members.push(lead);
        }
        for entry in self.proximity.iter() {
            if entry.end <= self.end {
                members.push(entry.idx);
            }
        }
        members
    }

    fn reset(&mut self) -> Result<()> {
        self.proximity.clear();
        self.background.clear();
        self.queue_end = 0;
        self.start = NO_MORE_INTERVALS;
        self.end = NO_MORE_INTERVALS;
        self.slop = 0;
        self.lead = None;
        for idx in self.driver.current_subs() {
            if self.subs[idx].next_interval()? != NO_MORE_INTERVALS {
                self.push_background(idx);
            }
        }
        for _ in 0..self.min_should_match {
            if let Some(entry) = self.background.pop() {
                self.push_proximity(entry.idx);
            }
        }
        trace!(
            doc = self.driver.doc_id(),
            members = self.proximity.len(),
            pooled = self.background.len(),
            "interval queues rebuilt"
        );
        Ok(())
    }

    fn push_background(&mut self, idx: usize) {
        self.background.push(EndQueueEntry {
            start: self.subs[idx].start(),
            end: self.subs[idx].end(),
            idx,
        });
    }

    fn push_proximity(&mut self, idx: usize) {
        let start = self.subs[idx].start();
        let end = self.subs[idx].end();
        self.queue_end = self.queue_end.max(end);
        self.proximity.push(StartQueueEntry { start, end, idx });
    }

    /// Advance `idx` past its current interval, returning it to the
    /// background pool if it has more, then promote the earliest-ending
    /// background member into the proximity queue.
    fn rotate(&mut self, idx: usize) -> Result<()> {
        if self.subs[idx].next_interval()? != NO_MORE_INTERVALS {
            self.push_background(idx);
        }
        if let Some(entry) = self.background.pop() {
            self.push_proximity(entry.idx);
        }
        Ok(())
    }

    fn update_slop(&mut self) {
        let covered: u32 = self.proximity.iter().map(|e| e.end - e.start + 1).sum();
        self.slop = self.width().saturating_sub(covered);
    }
}

impl IntervalIterator for MinimumShouldMatchIntervalIterator {
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
        self.lead = None;
        // discard members still starting at the previous window's start;
        // each discarded member cedes its slot to the background pool
        while self.proximity.len() == self.min_should_match {
            let idx = match self.proximity.peek() {
                Some(e) if e.start == self.start => e.idx,
                _ => break,
            };
            self.proximity.pop();
            self.rotate(idx)?;
        }
        if self.proximity.len() < self.min_should_match {
            self.start = NO_MORE_INTERVALS;
            self.end = NO_MORE_INTERVALS;
            return Ok(NO_MORE_INTERVALS);
        }
        // minimize: advance the leftmost member until the window cannot
        // shrink any further
        loop {
            let top = *self
                .proximity
                .peek()
                .expect("proximity queue holds min_should_match entries");
            self.start = top.start;
            self.end = self.queue_end;
            self.update_slop();
            if top.end == self.end {
                return Ok(self.start);
            }
            let lead = self
                .proximity
                .pop()
                .expect("proximity queue holds min_should_match entries");
            self.lead = Some(lead.idx);
            self.rotate(lead.idx)?;
            if self.proximity.len() != self.min_should_match || self.end != self.queue_end {
                return Ok(self.start);
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

/// Build the interval iterator for an `AtLeast` source, `Ok(None)` when
/// fewer than `min_should_match` sub-sources are applicable.
pub(crate) fn msm_intervals(
    sources: &[IntervalsSource],
    min_should_match: u32,
    field: &str,
    ctx: &SearchContext,
) -> Result<Option<Box<dyn IntervalIterator>>> {
    let mut subs = Vec::with_capacity(sources.len());
    for source in sources {
        if let Some(it) = source.intervals(field, ctx)? {
            subs.push(it);
        }
    }
    if (subs.len() as u32) < min_should_match {
        debug!(
            field,
            applicable = subs.len(),
            required = min_should_match,
            "too few applicable sources"
        );
        return Ok(None);
    }
    Ok(Some(Box::new(MinimumShouldMatchIntervalIterator::new(
        subs,
        min_should_match,
    ))))
}

/// Build the matches iterator for an `AtLeast` source against one document
pub(crate) fn msm_matches(
    sources: &[IntervalsSource],
    min_should_match: u32,
    field: &str,
    ctx: &SearchContext,
    doc: u32,
) -> Result<Option<Box<dyn MatchesIterator>>> {
    let mut shims = Vec::with_capacity(sources.len());
    for source in sources {
        if let Some(mi) = source.matches(field, ctx, doc)? {
            shims.push(Rc::new(RefCell::new(CachingMatchesIterator::new(field, mi))));
        }
    }
    if (shims.len() as u32) < min_should_match {
        return Ok(None);
    }
    let adapters: Vec<Box<dyn IntervalIterator>> = shims
        .iter()
        .map(|shim| {
            Box::new(MatchesIntervalAdapter::new(Rc::clone(shim), doc)) as Box<dyn IntervalIterator>
        })
        .collect();
    let mut iterator = MinimumShouldMatchIntervalIterator::new(adapters, min_should_match);
    if iterator.advance(doc)? != doc {
        return Ok(None);
    }
    if iterator.next_interval()? == NO_MORE_INTERVALS {
        return Ok(None);
    }
    Ok(Some(Box::new(MinimumMatchesIterator::new(iterator, shims))))
}

/// Matches iterator for `AtLeast` sources
///
/// The interval iterator was positioned on the first window during
/// construction, so the first `next` reports it without re-driving the
/// shims. Offsets aggregate over the subs inside the current window only.
pub(crate) struct MinimumMatchesIterator {
    iterator: MinimumShouldMatchIntervalIterator,
    shims: Vec<Rc<RefCell<CachingMatchesIterator>>>,
    cached: bool,
}

impl MinimumMatchesIterator {
    fn new(
        iterator: MinimumShouldMatchIntervalIterator,
        shims: Vec<Rc<RefCell<CachingMatchesIterator>>>,
    ) -> Self {
        Self {
            iterator,
            shims,
            cached: true,
        }
    }
}

impl MatchesIterator for MinimumMatchesIterator {
    fn next(&mut self) -> Result<bool> {
        if self.cached {
            self.cached = false;
            return Ok(true);
        }
        Ok(self.iterator.next_interval()? != NO_MORE_INTERVALS)
    }

    fn start_position(&self) -> u32 {
        self.iterator.start()
    }

    fn end_position(&self) -> u32 {
        self.iterator.end()
    }

    fn start_offset(&self) -> Result<u32> {
        let within = self.iterator.end();
        let mut offset = u32::MAX;
        for idx in self.iterator.current_iterators() {
            offset = offset.min(self.shims[idx].borrow().start_offset(within)?);
        }
        Ok(offset)
    }

    fn end_offset(&self) -> Result<u32> {
        let within = self.iterator.end();
        let mut offset = 0;
        for idx in self.iterator.current_iterators() {
            offset = offset.max(self.shims[idx].borrow().end_offset(within)?);
        }
        Ok(offset)
    }

    fn gaps(&self) -> u32 {
        self.iterator.gaps()
    }

    fn width(&self) -> u32 {
        self.iterator.width()
    }

    fn sub_matches(&mut self) -> Result<Option<Box<dyn MatchesIterator>>> {
        let field = self.shims[0].borrow().field().to_string();
        Ok(Some(disjoin_sub_matches(
            &field,
            &self.shims,
            &self.iterator.current_iterators(),
            self.iterator.end(),
        )))
    }

    fn source(&self) -> Option<IntervalsSource> {
        None
    }
}
