//! The interval iterator contract
//!
//! An `IntervalIterator` is a stateful, single-traversal object produced by
//! binding one source to a (field, context). It navigates at two
//! granularities: documents (`next_doc`/`advance`) and, within the current
//! document, intervals (`next_interval`). Traversal is strictly forward at
//! both levels.

use crate::Result;

/// Terminal sentinel for document navigation
pub const NO_MORE_DOCS: u32 = u32::MAX;

/// Terminal sentinel for interval navigation within a document
pub const NO_MORE_INTERVALS: u32 = u32::MAX;

/// Stateful traversal over the intervals of one bound source
///
/// Exactly one instance exists per active traversal; iterators are never
/// shared across threads or reused across documents without re-navigation.
/// Interval accessors (`start`, `end`, `gaps`, `width`) are only meaningful
/// while positioned on an interval; outside of that they report
/// `NO_MORE_INTERVALS`-derived values. `doc_id` reports `NO_MORE_DOCS` both
/// before the first navigation call and after exhaustion.
pub trait IntervalIterator {
    /// Start position of the current interval
    fn start(&self) -> u32;

    /// End position of the current interval
    fn end(&self) -> u32;

    /// Looseness of the current interval: its width beyond the sum of the
    /// widths of its constituent intervals
    fn gaps(&self) -> u32;

    /// Number of token positions covered by the current interval
    fn width(&self) -> u32 {
        self.end() - self.start() + 1
    }

    /// Move to the next interval within the current document
    ///
    /// Returns the new start position, or `NO_MORE_INTERVALS` when the
    /// document is exhausted for this source.
    fn next_interval(&mut self) -> Result<u32>;

    /// Current document id
    fn doc_id(&self) -> u32;

    /// Move to the next document containing a candidate match
    fn next_doc(&mut self) -> Result<u32>;

    /// Move to the first candidate document with id >= `target`
    ///
    /// A no-op returning the current document when already positioned at or
    /// beyond `target`.
    fn advance(&mut self, target: u32) -> Result<u32>;

    /// Estimated number of documents this iterator will visit
    fn cost(&self) -> u64;

    /// Advisory per-document matching cost, used by callers to order clauses
    fn match_cost(&self) -> f32;
}
