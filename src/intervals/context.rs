//! Per-search binding context

use crate::reader::PositionsReader;
use std::sync::Arc;

/// Everything a source needs to bind itself to an index
///
/// Cheap to clone; traversal state lives in the iterators, never here, so one
/// context can serve any number of concurrent traversals.
#[derive(Clone)]
pub struct SearchContext {
    reader: Arc<dyn PositionsReader>,
}

impl SearchContext {
    pub fn new(reader: Arc<dyn PositionsReader>) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &dyn PositionsReader {
        self.reader.as_ref()
    }
}
