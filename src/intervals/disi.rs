//! Document-level drivers
//!
//! Interval combinators navigate documents before they navigate positions.
//! Disjunctive combinators use `DocIdDisjunction`, which merges the per-sub
//! document streams and exposes which subs sit on the current minimum doc id.
//! Conjunctive combinators use leapfrog alignment, which advances all subs to
//! a shared document or past it.

use crate::intervals::iterator::{IntervalIterator, NO_MORE_DOCS};
use crate::Result;

/// Coarse doc-id-level merge over N sub-iterators
///
/// Keeps a mirror of each sub's current document so that the expensive
/// interval-level machinery only runs on documents where at least one sub is
/// present. The clause count is small, so a linear minimum scan is used
/// rather than a heap.
#[derive(Debug)]
pub(crate) struct DocIdDisjunction {
    // None until the sub has been navigated at least once
    docs: Vec<Option<u32>>,
    current: u32,
    started: bool,
}

impl DocIdDisjunction {
    pub fn new(len: usize) -> Self {
        Self {
            docs: vec![None; len],
            current: NO_MORE_DOCS,
            started: false,
        }
    }

    /// Current document id, `NO_MORE_DOCS` when unpositioned or exhausted
    pub fn doc_id(&self) -> u32 {
        self.current
    }

    /// Advance to the next document where any sub is present
    pub fn next_doc(&mut self, subs: &mut [Box<dyn IntervalIterator>]) -> Result<u32> {
        if self.started {
            if self.current == NO_MORE_DOCS {
                return Ok(NO_MORE_DOCS);
            }
            for (i, sub) in subs.iter_mut().enumerate() {
                if self.docs[i] == Some(self.current) {
                    self.docs[i] = Some(sub.next_doc()?);
                }
            }
        } else {
            self.started = true;
            for (i, sub) in subs.iter_mut().enumerate() {
                self.docs[i] = Some(sub.next_doc()?);
            }
        }
        self.refresh_current();
        Ok(self.current)
    }

    /// Advance to the first document >= `target` where any sub is present
    pub fn advance(&mut self, target: u32, subs: &mut [Box<dyn IntervalIterator>]) -> Result<u32> {
        self.started = true;
        for (i, sub) in subs.iter_mut().enumerate() {
            if self.docs[i].map_or(true, |d| d < target) {
                self.docs[i] = Some(sub.advance(target)?);
            }
        }
        self.refresh_current();
        Ok(self.current)
    }

    /// Indices of the subs positioned on the current document
    pub fn current_subs(&self) -> Vec<usize> {
        if self.current == NO_MORE_DOCS {
            return Vec::new();
        }
        self.docs
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == Some(self.current))
            .map(|(i, _)| i)
            .collect()
    }

    fn refresh_current(&mut self) {
        self.current = self
            .docs
            .iter()
            .flatten()
            .copied()
            .min()
            .unwrap_or(NO_MORE_DOCS);
    }
}

/// Leapfrog all subs onto the same document, starting from `doc` on sub 0
///
/// `doc` must be where `subs[0]` currently sits. Returns the first shared
/// document >= `doc`, or `NO_MORE_DOCS`.
fn conjunction_align(subs: &mut [Box<dyn IntervalIterator>], mut doc: u32) -> Result<u32> {
    'outer: while doc != NO_MORE_DOCS {
        for i in 1..subs.len() {
            let d = subs[i].advance(doc)?;
            if d != doc {
                doc = subs[0].advance(d)?;
                continue 'outer;
            }
        }
        return Ok(doc);
    }
    Ok(NO_MORE_DOCS)
}

/// Next document present in every sub
pub(crate) fn conjunction_next_doc(subs: &mut [Box<dyn IntervalIterator>]) -> Result<u32> {
    let doc = subs[0].next_doc()?;
    conjunction_align(subs, doc)
}

/// First document >= `target` present in every sub
pub(crate) fn conjunction_advance(
    subs: &mut [Box<dyn IntervalIterator>],
    target: u32,
) -> Result<u32> {
    let doc = subs[0].advance(target)?;
    conjunction_align(subs, doc)
}
