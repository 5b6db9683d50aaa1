//! Positional postings access for interval queries
//!
//! Interval sources are driven by token positions, not just document ids, so
//! they read through the `PositionsReader` trait rather than a plain posting
//! bitmap. The index/storage machinery behind it (segments, codecs,
//! tombstones) is deliberately out of scope; `MemoryIndex` provides a small
//! in-memory implementation for tests, benches and embedding.

use crate::Result;
use std::collections::{BTreeMap, HashMap};

/// Character offset range of one token occurrence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffsetRange {
    /// Offset of the first character of the token
    pub start: u32,
    /// Offset one past the last character of the token
    pub end: u32,
}

/// Positions (and optionally offsets) of a term within one document
#[derive(Clone, Debug)]
pub struct PositionsEntry {
    /// Document id
    pub doc: u32,
    /// Token positions, strictly ascending
    pub positions: Vec<u32>,
    /// Character offsets parallel to `positions`; `None` when the field was
    /// indexed without offsets
    pub offsets: Option<Vec<OffsetRange>>,
}

/// Full positional posting list for one (field, term) pair
///
/// Entries are sorted by ascending document id.
#[derive(Clone, Debug, Default)]
pub struct TermPostings {
    pub entries: Vec<PositionsEntry>,
}

impl TermPostings {
    /// Look up the entry for a single document, if present
    pub fn entry_for(&self, doc: u32) -> Option<&PositionsEntry> {
        self.entries
            .binary_search_by_key(&doc, |e| e.doc)
            .ok()
            .map(|i| &self.entries[i])
    }
}

/// Trait for reading positional postings from an index
///
/// Implementations may perform I/O; failures propagate to the traversal that
/// observed them. A `None` return means the term does not occur in the field
/// at all, which makes the corresponding source inapplicable.
pub trait PositionsReader: Send + Sync {
    /// Positional postings for a term in a field, sorted by document id
    fn term_positions(&self, field: &str, term: &str) -> Result<Option<TermPostings>>;
}

/// In-memory positional index
///
/// Documents can be ingested either as whitespace-separated text (which
/// records character offsets for highlighting) or as raw position lists
/// (no offsets), which is convenient for synthetic traversal tests.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    // (field, term) -> doc -> entry
    postings: HashMap<(String, String), BTreeMap<u32, PositionsEntry>>,
}

impl MemoryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a document field from whitespace-separated text
    ///
    /// Each token gets the next position in the field and its character
    /// offsets within `text`. Analysis beyond whitespace splitting belongs to
    /// the tokenization layer and is not performed here.
    pub fn index_text(&mut self, doc: u32, field: &str, text: &str) {
        let mut position = 0u32;
        let mut byte = 0usize;
        let bytes = text.as_bytes();
        while byte < bytes.len() {
            while byte < bytes.len() && bytes[byte].is_ascii_whitespace() {
                byte += 1;
            }
            let start = byte;
            while byte < bytes.len() && !bytes[byte].is_ascii_whitespace() {
                byte += 1;
            }
            if byte > start {
                let term = &text[start..byte];
                self.push_occurrence(
                    doc,
                    field,
                    term,
                    position,
                    Some(OffsetRange {
                        start: start as u32,
                        end: byte as u32,
                    }),
                );
                position += 1;
            }
        }
    }

    /// Index explicit positions for a (doc, field, term) triple, no offsets
    pub fn insert_positions(&mut self, doc: u32, field: &str, term: &str, positions: &[u32]) {
        for &p in positions {
            self.push_occurrence(doc, field, term, p, None);
        }
    }

    fn push_occurrence(
        &mut self,
        doc: u32,
        field: &str,
        term: &str,
        position: u32,
        offset: Option<OffsetRange>,
    ) {
        let entry = self
            .postings
            .entry((field.to_string(), term.to_string()))
            .or_default()
            .entry(doc)
            .or_insert_with(|| PositionsEntry {
                doc,
                positions: Vec::new(),
                offsets: offset.is_some().then(Vec::new),
            });
        entry.positions.push(position);
        if let (Some(offsets), Some(off)) = (entry.offsets.as_mut(), offset) {
            offsets.push(off);
        }
    }
}

impl PositionsReader for MemoryIndex {
    fn term_positions(&self, field: &str, term: &str) -> Result<Option<TermPostings>> {
        let key = (field.to_string(), term.to_string());
        Ok(self.postings.get(&key).map(|docs| TermPostings {
            entries: docs.values().cloned().collect(),
        }))
    }
}
