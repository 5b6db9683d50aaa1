//! Ordered (phrase-like) interval composition
//!
//! An ordered interval exists where every sub-iterator matches in clause
//! order, each starting strictly after its predecessor ends. Candidate
//! windows are minimized lazily: once a complete chain is found, the first
//! sub is advanced to look for a tighter chain with the same final interval,
//! and the recorded candidate is only reported when no tightening remains.

use crate::intervals::disi::{conjunction_advance, conjunction_next_doc};
use crate::intervals::iterator::{IntervalIterator, NO_MORE_DOCS, NO_MORE_INTERVALS};
use crate::Result;

pub(crate) struct OrderedIntervalIterator {
    subs: Vec<Box<dyn IntervalIterator>>,
    start: u32,
    end: u32,
    slop: u32,
    // set when a sub ran out of intervals for the current document
    exhausted: bool,
    cost: u64,
    match_cost: f32,
}

impl OrderedIntervalIterator {
    pub fn new(subs: Vec<Box<dyn IntervalIterator>>) -> Self {
        debug_assert!(!subs.is_empty());
        // a conjunction visits at most as many docs as its rarest clause
        let cost = subs.iter().map(|s| s.cost()).min().unwrap_or(0);
        let match_cost = subs.iter().map(|s| s.match_cost()).sum();
        Self {
            subs,
            start: NO_MORE_INTERVALS,
            end: NO_MORE_INTERVALS,
            slop: 0,
            exhausted: true,
            cost,
            match_cost,
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.start = NO_MORE_INTERVALS;
        self.end = NO_MORE_INTERVALS;
        self.slop = 0;
        self.exhausted = false;
        for sub in &mut self.subs {
            if sub.next_interval()? == NO_MORE_INTERVALS {
                // a candidate doc where some sub has no intervals
                self.exhausted = true;
                return Ok(());
            }
        }
        Ok(())
    }

    fn record_candidate(&mut self) -> u32 {
        let n = self.subs.len();
        self.start = self.subs[0].start();
        self.end = self.subs[n - 1].end();
        let covered: u32 = self.subs.iter().map(|s| s.width()).sum();
        self.slop = (self.end - self.start + 1).saturating_sub(covered);
        self.subs[n - 1].start()
    }
}

impl IntervalIterator for OrderedIntervalIterator {
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
        if self.exhausted {
            self.start = NO_MORE_INTERVALS;
            self.end = NO_MORE_INTERVALS;
            return Ok(NO_MORE_INTERVALS);
        }
        let n = self.subs.len();
        self.start = NO_MORE_INTERVALS;
        self.end = NO_MORE_INTERVALS;
        self.slop = 0;
        let mut have = false;
        // start of the last sub when the candidate was recorded; advancing
        // any earlier sub to or past it cannot tighten the candidate
        let mut bound = u32::MAX;
        loop {
            // repair the chain so each sub starts strictly after its
            // predecessor ends
            let mut i = 1;
            while i < n {
                if self.subs[i].start() > self.subs[i - 1].end() {
                    i += 1;
                    continue;
                }
                if have && self.subs[i].end() >= bound {
                    return Ok(self.start);
                }
                if self.subs[i].next_interval()? == NO_MORE_INTERVALS {
                    self.exhausted = true;
                    if !have {
                        self.start = NO_MORE_INTERVALS;
                        self.end = NO_MORE_INTERVALS;
                    }
                    return Ok(self.start);
                }
            }
            bound = self.record_candidate();
            have = true;
            // try to tighten by advancing the first sub
            if self.subs[0].next_interval()? == NO_MORE_INTERVALS {
                self.exhausted = true;
                return Ok(self.start);
            }
            if self.subs[0].end() >= bound {
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
