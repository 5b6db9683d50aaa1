//! Term leaf source iterators
//!
//! A term occurrence is the narrowest possible interval: one token position,
//! so `start == end` and `gaps == 0`. The interval iterator walks positional
//! postings document by document; the matches iterator replays the
//! occurrences of a single document with character offsets for highlighting.

use crate::intervals::iterator::{IntervalIterator, NO_MORE_DOCS, NO_MORE_INTERVALS};
use crate::intervals::matches::MatchesIterator;
use crate::intervals::source::IntervalsSource;
use crate::reader::{OffsetRange, PositionsEntry};
use crate::{ProxidexError, Result};

/// Interval iterator over the positional postings of one term
pub(crate) struct TermIntervalIterator {
    postings: Vec<PositionsEntry>,
    // postings cursor; None before the first doc navigation
    cursor: Option<usize>,
    // position cursor within the current doc; None before the first
    // next_interval on this doc
    pos: Option<usize>,
    exhausted: bool,
}

impl TermIntervalIterator {
    pub fn new(postings: Vec<PositionsEntry>) -> Self {
        Self {
            postings,
            cursor: None,
            pos: None,
            exhausted: false,
        }
    }

    fn current(&self) -> Option<&PositionsEntry> {
        if self.exhausted {
            return None;
        }
        self.cursor.map(|c| &self.postings[c])
    }

    fn current_position(&self) -> Option<u32> {
        let entry = self.current()?;
        let pos = self.pos?;
        entry.positions.get(pos).copied()
    }

    fn settle(&mut self, cursor: usize) -> u32 {
        self.pos = None;
        if cursor >= self.postings.len() {
            self.exhausted = true;
            NO_MORE_DOCS
        } else {
            self.cursor = Some(cursor);
            self.postings[cursor].doc
        }
    }
}

impl IntervalIterator for TermIntervalIterator {
    fn start(&self) -> u32 {
        self.current_position().unwrap_or(NO_MORE_INTERVALS)
    }

    fn end(&self) -> u32 {
        self.start()
    }

    fn gaps(&self) -> u32 {
        0
    }

    fn next_interval(&mut self) -> Result<u32> {
        let next = self.pos.map_or(0, |i| i + 1);
        let (len, position) = match self.current() {
            None => return Ok(NO_MORE_INTERVALS),
            Some(entry) => (entry.positions.len(), entry.positions.get(next).copied()),
        };
        match position {
            Some(p) => {
                self.pos = Some(next);
                Ok(p)
            }
            None => {
                // park past the end so repeated calls stay terminal
                self.pos = Some(len);
                Ok(NO_MORE_INTERVALS)
            }
        }
    }

    fn doc_id(&self) -> u32 {
        match (self.exhausted, self.cursor) {
            (false, Some(c)) => self.postings[c].doc,
            _ => NO_MORE_DOCS,
        }
    }

    fn next_doc(&mut self) -> Result<u32> {
        if self.exhausted {
            return Ok(NO_MORE_DOCS);
        }
        let next = match self.cursor {
            None => 0,
            Some(c) => c + 1,
        };
        Ok(self.settle(next))
    }

    fn advance(&mut self, target: u32) -> Result<u32> {
        if self.exhausted {
            return Ok(NO_MORE_DOCS);
        }
        if let Some(c) = self.cursor {
            if self.postings[c].doc >= target {
                return Ok(self.postings[c].doc);
            }
        }
        let from = self.cursor.map_or(0, |c| c + 1);
        let next = from + self.postings[from..].partition_point(|e| e.doc < target);
        Ok(self.settle(next))
    }

    fn cost(&self) -> u64 {
        self.postings.len() as u64
    }

    fn match_cost(&self) -> f32 {
        1.0
    }
}

/// Matches iterator over one document's occurrences of a term
pub(crate) struct TermMatchesIterator {
    field: String,
    positions: Vec<u32>,
    offsets: Option<Vec<OffsetRange>>,
    source: IntervalsSource,
    idx: Option<usize>,
}

impl TermMatchesIterator {
    pub fn new(field: &str, entry: &PositionsEntry, source: IntervalsSource) -> Self {
        Self {
            field: field.to_string(),
            positions: entry.positions.clone(),
            offsets: entry.offsets.clone(),
            source,
            idx: None,
        }
    }

    fn offset(&self) -> Result<OffsetRange> {
        let idx = self.idx.expect("matches iterator queried before next()");
        self.offsets
            .as_ref()
            .map(|o| o[idx])
            .ok_or_else(|| ProxidexError::OffsetsUnavailable(self.field.clone()))
    }
}

impl MatchesIterator for TermMatchesIterator {
    fn next(&mut self) -> Result<bool> {
        let next = self.idx.map_or(0, |i| i + 1);
        if next < self.positions.len() {
            self.idx = Some(next);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn start_position(&self) -> u32 {
        self.idx
            .map(|i| self.positions[i])
            .unwrap_or(NO_MORE_INTERVALS)
    }

    fn end_position(&self) -> u32 {
        self.start_position()
    }

    fn start_offset(&self) -> Result<u32> {
        Ok(self.offset()?.start)
    }

    fn end_offset(&self) -> Result<u32> {
        Ok(self.offset()?.end)
    }

    fn gaps(&self) -> u32 {
        0
    }

    fn width(&self) -> u32 {
        1
    }

    fn sub_matches(&mut self) -> Result<Option<Box<dyn MatchesIterator>>> {
        Ok(None)
    }

    fn source(&self) -> Option<IntervalsSource> {
        Some(self.source.clone())
    }
}
