//! Interval queries over positional postings
//!
//! Sources are built through the factory functions here and bound to a
//! (field, [`SearchContext`]) pair to produce iterators:
//!
//! - [`term`] matches single token occurrences
//! - [`ordered`] / [`phrase`] match clauses in order, non-overlapping
//! - [`unordered`] matches clauses in any order within one window
//! - [`or`] merges the matches of any clause
//! - [`at_least`] finds minimal windows holding `min_should_match` clauses
//!
//! Interval streams are per-document and ordered by ascending start; `gaps`
//! reports how loose each window is. See the crate docs for a worked
//! example.

mod context;
mod disi;
mod disjunction;
mod iterator;
mod matches;
mod min_should_match;
mod ordered;
mod queue;
mod source;
mod term;
mod unordered;

pub use context::SearchContext;
pub use iterator::{IntervalIterator, NO_MORE_DOCS, NO_MORE_INTERVALS};
pub use matches::MatchesIterator;
pub use source::{IntervalsSource, Occur, SourceVisitor};

/// A single-term source
pub fn term(term: impl Into<String>) -> IntervalsSource {
    IntervalsSource::Term(term.into())
}

/// An ordered source over the whitespace-separated terms of `text`
pub fn phrase(text: &str) -> IntervalsSource {
    let terms: Vec<IntervalsSource> = text.split_whitespace().map(term).collect();
    if terms.len() == 1 {
        return terms.into_iter().next().expect("one term");
    }
    ordered(terms)
}

/// Clauses matching in order, each strictly after its predecessor
///
/// # Panics
///
/// Panics when `sources` is empty.
pub fn ordered(sources: Vec<IntervalsSource>) -> IntervalsSource {
    assert!(!sources.is_empty(), "ordered requires at least one clause");
    IntervalsSource::Ordered(sources)
}

/// Clauses matching in any order within one enclosing window
///
/// # Panics
///
/// Panics when `sources` is empty.
pub fn unordered(sources: Vec<IntervalsSource>) -> IntervalsSource {
    assert!(!sources.is_empty(), "unordered requires at least one clause");
    IntervalsSource::Unordered(sources)
}

/// Any clause
///
/// # Panics
///
/// Panics when `sources` is empty.
pub fn or(sources: Vec<IntervalsSource>) -> IntervalsSource {
    assert!(!sources.is_empty(), "or requires at least one clause");
    IntervalsSource::Disjunction(sources)
}

/// Minimal windows containing at least `min_should_match` clauses
///
/// # Panics
///
/// Panics unless `1 <= min_should_match < sources.len()`. With
/// `min_should_match == sources.len()` use [`unordered`] instead.
pub fn at_least(sources: Vec<IntervalsSource>, min_should_match: u32) -> IntervalsSource {
    assert!(min_should_match >= 1, "min_should_match must be positive");
    assert!(
        (min_should_match as usize) < sources.len(),
        "min_should_match must be smaller than the clause count"
    );
    IntervalsSource::AtLeast {
        sources,
        min_should_match,
    }
}
