//! Proxidex: proximity and interval matching for full-text search
//!
//! This crate implements the interval-matching layer of a search engine:
//! given several independently-iterating sub-queries, each reporting the
//! token-position ranges where it matched a document, it composes them into
//! windows — ordered phrases, unordered neighbourhoods, disjunctions, and an
//! "at least k of n" combinator that finds minimal enclosing windows
//! satisfying a minimum-should-match threshold.
//!
//! Two modes of traversal are supported:
//! - Interval iteration: stream `(start, end, gaps)` windows per document,
//!   in increasing order, for query evaluation.
//! - Match materialization: replay the same windows with character offsets
//!   and nested sub-matches, for highlighting and explain output.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use proxidex::intervals::{self, SearchContext};
//! use proxidex::reader::MemoryIndex;
//! use proxidex::{IntervalIterator, NO_MORE_INTERVALS};
//!
//! let mut index = MemoryIndex::new();
//! index.index_text(0, "content", "rust makes systems programming safe");
//!
//! let source = intervals::at_least(
//!     vec![
//!         intervals::term("rust"),
//!         intervals::term("programming"),
//!         intervals::term("unsafe"),
//!     ],
//!     2,
//! );
//!
//! let ctx = SearchContext::new(Arc::new(index));
//! let mut it = source.intervals("content", &ctx).unwrap().unwrap();
//! it.next_doc().unwrap();
//! assert_ne!(it.next_interval().unwrap(), NO_MORE_INTERVALS);
//! assert_eq!((it.start(), it.end()), (0, 3));
//! ```

pub mod error;
pub mod intervals;
pub mod reader;

pub use error::{ProxidexError, Result};
pub use intervals::{IntervalIterator, IntervalsSource, MatchesIterator, SearchContext};
pub use intervals::{NO_MORE_DOCS, NO_MORE_INTERVALS};
pub use reader::{MemoryIndex, PositionsReader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
