//! Match materialization
//!
//! Interval iteration answers "where did this query match"; match
//! materialization additionally answers "which characters do I highlight"
//! and "which sub-queries participated". The composed iterators here replay
//! the interval algorithms over cached per-sub match state so that offsets
//! can be queried repeatedly without re-driving the underlying enumerations.

use crate::intervals::iterator::{IntervalIterator, NO_MORE_DOCS, NO_MORE_INTERVALS};
use crate::intervals::source::IntervalsSource;
use crate::{ProxidexError, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// One materialized match of a query against one document
///
/// `next()` drives the enumeration; the accessors describe the current
/// match. Character offsets fail with `OffsetsUnavailable` when the field
/// was indexed without them.
pub trait MatchesIterator {
    /// Move to the next match; `false` when the document is exhausted
    fn next(&mut self) -> Result<bool>;

    /// Token position where the current match starts
    fn start_position(&self) -> u32;

    /// Token position where the current match ends
    fn end_position(&self) -> u32;

    /// Character offset of the first matching token
    fn start_offset(&self) -> Result<u32>;

    /// Character offset past the last matching token
    fn end_offset(&self) -> Result<u32>;

    /// Looseness of the current match window
    fn gaps(&self) -> u32;

    /// Number of token positions covered by the current match
    fn width(&self) -> u32;

    /// Constituent matches of the current match, `None` for leaves
    fn sub_matches(&mut self) -> Result<Option<Box<dyn MatchesIterator>>>;

    /// The source this match came from, when it has a reportable identity
    fn source(&self) -> Option<IntervalsSource>;
}

/// A fully materialized match: positions, offsets, and flattened sub-matches
#[derive(Clone, Debug)]
pub(crate) struct MatchFrame {
    pub start_position: u32,
    pub end_position: u32,
    pub start_offset: Option<u32>,
    pub end_offset: Option<u32>,
    pub gaps: u32,
    pub source: Option<IntervalsSource>,
    pub subs: Vec<MatchFrame>,
}

fn optional_offset(offset: Result<u32>) -> Result<Option<u32>> {
    match offset {
        Ok(v) => Ok(Some(v)),
        Err(ProxidexError::OffsetsUnavailable(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn capture_shallow(mi: &mut dyn MatchesIterator) -> Result<MatchFrame> {
    Ok(MatchFrame {
        start_position: mi.start_position(),
        end_position: mi.end_position(),
        start_offset: optional_offset(mi.start_offset())?,
        end_offset: optional_offset(mi.end_offset())?,
        gaps: mi.gaps(),
        source: mi.source(),
        subs: Vec::new(),
    })
}

/// Caching shim around one sub-source's one-document matches iterator
///
/// Records the current match (and the one before it) as `MatchFrame`s so the
/// composed adapter can keep answering offset and sub-match queries for a
/// reported window even after the underlying iterator was advanced past it
/// during minimization. Queries are bounded by the composed window's end
/// position, which selects between the live and the recorded match.
pub(crate) struct CachingMatchesIterator {
    field: String,
    inner: Box<dyn MatchesIterator>,
    live: Option<MatchFrame>,
    prev: Option<MatchFrame>,
    exhausted: bool,
}

impl CachingMatchesIterator {
    pub fn new(field: &str, inner: Box<dyn MatchesIterator>) -> Self {
        Self {
            field: field.to_string(),
            inner,
            live: None,
            prev: None,
            exhausted: false,
        }
    }

    /// Advance the underlying iterator, refreshing the cached frames
    pub fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if self.inner.next()? {
            if let Some(frame) = self.live.take() {
                self.prev = Some(frame);
            }
            let mut frame = capture_shallow(self.inner.as_mut())?;
            if let Some(mut subs) = self.inner.sub_matches()? {
                while subs.next()? {
                    frame.subs.push(capture_shallow(subs.as_mut())?);
                }
            }
            self.live = Some(frame);
            Ok(true)
        } else {
            // keep the last match queryable
            self.exhausted = true;
            Ok(false)
        }
    }

    /// Start position of the live (most recently loaded) match
    pub fn start_position(&self) -> u32 {
        self.live
            .as_ref()
            .map(|f| f.start_position)
            .unwrap_or(NO_MORE_INTERVALS)
    }

    /// End position of the live match
    pub fn end_position(&self) -> u32 {
        self.live
            .as_ref()
            .map(|f| f.end_position)
            .unwrap_or(NO_MORE_INTERVALS)
    }

    /// Gaps of the live match
    pub fn live_gaps(&self) -> u32 {
        self.live.as_ref().map(|f| f.gaps).unwrap_or(0)
    }

    /// The recorded match lying inside a window ending at `within_end`
    pub fn frame_within(&self, within_end: u32) -> &MatchFrame {
        let live = self.live.as_ref().expect("shim queried before first match");
        if live.end_position <= within_end {
            live
        } else {
            self.prev
                .as_ref()
                .expect("no recorded match inside the reported window")
        }
    }

    pub fn start_offset(&self, within_end: u32) -> Result<u32> {
        self.frame_within(within_end)
            .start_offset
            .ok_or_else(|| ProxidexError::OffsetsUnavailable(self.field.clone()))
    }

    pub fn end_offset(&self, within_end: u32) -> Result<u32> {
        self.frame_within(within_end)
            .end_offset
            .ok_or_else(|| ProxidexError::OffsetsUnavailable(self.field.clone()))
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Collect the sub-match frames of every participating shim into one
/// position-ordered matches iterator, falling back to a shim's own frame
/// when it has no nested sub-matches.
pub(crate) fn disjoin_sub_matches(
    field: &str,
    shims: &[Rc<RefCell<CachingMatchesIterator>>],
    participating: &[usize],
    within_end: u32,
) -> Box<dyn MatchesIterator> {
    let mut frames = Vec::new();
    for &idx in participating {
        let shim = shims[idx].borrow();
        let frame = shim.frame_within(within_end);
        if frame.subs.is_empty() {
            frames.push(frame.clone());
        } else {
            frames.extend(frame.subs.iter().cloned());
        }
    }
    frames.sort_by_key(|f| (f.start_position, f.end_position));
    Box::new(CachedMatchesIterator::new(field, frames))
}

/// Matches iterator replaying a list of materialized frames
pub(crate) struct CachedMatchesIterator {
    field: String,
    frames: Vec<MatchFrame>,
    idx: Option<usize>,
}

impl CachedMatchesIterator {
    pub fn new(field: &str, frames: Vec<MatchFrame>) -> Self {
        Self {
            field: field.to_string(),
            frames,
            idx: None,
        }
    }

    fn current(&self) -> &MatchFrame {
        let idx = self.idx.expect("matches iterator queried before next()");
        &self.frames[idx]
    }
}

impl MatchesIterator for CachedMatchesIterator {
    fn next(&mut self) -> Result<bool> {
        let next = self.idx.map_or(0, |i| i + 1);
        if next < self.frames.len() {
            self.idx = Some(next);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn start_position(&self) -> u32 {
        self.current().start_position
    }

    fn end_position(&self) -> u32 {
        self.current().end_position
    }

    fn start_offset(&self) -> Result<u32> {
        self.current()
            .start_offset
            .ok_or_else(|| ProxidexError::OffsetsUnavailable(self.field.clone()))
    }

    fn end_offset(&self) -> Result<u32> {
        self.current()
            .end_offset
            .ok_or_else(|| ProxidexError::OffsetsUnavailable(self.field.clone()))
    }

    fn gaps(&self) -> u32 {
        self.current().gaps
    }

    fn width(&self) -> u32 {
        let f = self.current();
        f.end_position - f.start_position + 1
    }

    fn sub_matches(&mut self) -> Result<Option<Box<dyn MatchesIterator>>> {
        let subs = &self.current().subs;
        if subs.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Box::new(CachedMatchesIterator::new(
                &self.field,
                subs.clone(),
            ))))
        }
    }

    fn source(&self) -> Option<IntervalsSource> {
        self.current().source.clone()
    }
}

/// State of a one-document matches-to-intervals adapter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AdapterState {
    Unpositioned,
    // first match loaded, not yet reported through next_interval
    Positioned,
    Iterating,
    NoMoreIntervals,
    NoMoreDocs,
}

/// Adapter exposing a caching shim as a single-document interval iterator
///
/// This is what lets the interval algorithms replay their decisions in
/// matches mode: document navigation succeeds only for the one target
/// document, and interval navigation drives the shim. The first
/// `next_interval` after positioning reports the already-loaded match.
pub(crate) struct MatchesIntervalAdapter {
    shim: Rc<RefCell<CachingMatchesIterator>>,
    doc: u32,
    state: AdapterState,
}

impl MatchesIntervalAdapter {
    pub fn new(shim: Rc<RefCell<CachingMatchesIterator>>, doc: u32) -> Self {
        Self {
            shim,
            doc,
            state: AdapterState::Unpositioned,
        }
    }

    fn load_first(&mut self) -> Result<u32> {
        if self.shim.borrow_mut().next()? {
            self.state = AdapterState::Positioned;
            Ok(self.doc)
        } else {
            self.state = AdapterState::NoMoreDocs;
            Ok(NO_MORE_DOCS)
        }
    }

    fn positioned(&self) -> bool {
        matches!(
            self.state,
            AdapterState::Positioned | AdapterState::Iterating
        )
    }
}

impl IntervalIterator for MatchesIntervalAdapter {
    fn start(&self) -> u32 {
        if self.positioned() {
            self.shim.borrow().start_position()
        } else {
            NO_MORE_INTERVALS
        }
    }

    fn end(&self) -> u32 {
        if self.positioned() {
            self.shim.borrow().end_position()
        } else {
            NO_MORE_INTERVALS
        }
    }

    fn gaps(&self) -> u32 {
        if self.positioned() {
            self.shim.borrow().live_gaps()
        } else {
            0
        }
    }

    fn next_interval(&mut self) -> Result<u32> {
        match self.state {
            AdapterState::Positioned => {
                self.state = AdapterState::Iterating;
                Ok(self.start())
            }
            AdapterState::Iterating => {
                if self.shim.borrow_mut().next()? {
                    Ok(self.start())
                } else {
                    self.state = AdapterState::NoMoreIntervals;
                    Ok(NO_MORE_INTERVALS)
                }
            }
            _ => Ok(NO_MORE_INTERVALS),
        }
    }

    fn doc_id(&self) -> u32 {
        match self.state {
            AdapterState::Unpositioned | AdapterState::NoMoreDocs => NO_MORE_DOCS,
            _ => self.doc,
        }
    }

    fn next_doc(&mut self) -> Result<u32> {
        match self.state {
            AdapterState::Unpositioned => self.load_first(),
            _ => {
                self.state = AdapterState::NoMoreDocs;
                Ok(NO_MORE_DOCS)
            }
        }
    }

    fn advance(&mut self, target: u32) -> Result<u32> {
        match self.state {
            AdapterState::Unpositioned if target <= self.doc => self.load_first(),
            AdapterState::NoMoreDocs | AdapterState::Unpositioned => {
                self.state = AdapterState::NoMoreDocs;
                Ok(NO_MORE_DOCS)
            }
            _ if target <= self.doc => Ok(self.doc),
            _ => {
                self.state = AdapterState::NoMoreDocs;
                Ok(NO_MORE_DOCS)
            }
        }
    }

    fn cost(&self) -> u64 {
        1
    }

    fn match_cost(&self) -> f32 {
        0.0
    }
}

/// Matches iterator for conjunction sources (ordered/unordered)
///
/// Every sub participates in every window, so offsets aggregate over all
/// shims, bounded by the window's end position. The interval iterator was
/// already positioned on the first window at construction; the first `next`
/// reuses it.
pub(crate) struct ConjunctionMatchesIterator {
    iterator: Box<dyn IntervalIterator>,
    shims: Vec<Rc<RefCell<CachingMatchesIterator>>>,
    participating: Vec<usize>,
    cached: bool,
}

impl ConjunctionMatchesIterator {
    pub fn new(
        iterator: Box<dyn IntervalIterator>,
        shims: Vec<Rc<RefCell<CachingMatchesIterator>>>,
    ) -> Self {
        let participating = (0..shims.len()).collect();
        Self {
            iterator,
            shims,
            participating,
            cached: true,
        }
    }
}

impl MatchesIterator for ConjunctionMatchesIterator {
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
        for shim in &self.shims {
            offset = offset.min(shim.borrow().start_offset(within)?);
        }
        Ok(offset)
    }

    fn end_offset(&self) -> Result<u32> {
        let within = self.iterator.end();
        let mut offset = 0;
        for shim in &self.shims {
            offset = offset.max(shim.borrow().end_offset(within)?);
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
            &self.participating,
            self.iterator.end(),
        )))
    }

    fn source(&self) -> Option<IntervalsSource> {
        None
    }
}
