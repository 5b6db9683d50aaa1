//! Interval sources
//!
//! `IntervalsSource` is the immutable, closed set of query shapes the
//! interval layer understands. A source is field-independent; binding it to
//! a field and a `SearchContext` produces per-traversal iterators. Sources
//! compare structurally (clause order matters) and serialize with serde so
//! query trees can round-trip through a JSON DSL.

use crate::intervals::context::SearchContext;
use crate::intervals::disjunction::{DisjunctionIntervalIterator, DisjunctionMatchesIterator};
use crate::intervals::iterator::{IntervalIterator, NO_MORE_INTERVALS};
use crate::intervals::matches::{
    CachingMatchesIterator, ConjunctionMatchesIterator, MatchesIntervalAdapter, MatchesIterator,
};
use crate::intervals::min_should_match::{msm_intervals, msm_matches};
use crate::intervals::ordered::OrderedIntervalIterator;
use crate::intervals::term::{TermIntervalIterator, TermMatchesIterator};
use crate::intervals::unordered::UnorderedIntervalIterator;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// How a composite source combines its children, for query introspection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occur {
    /// Every child participates in every match
    Must,
    /// A subset of children participates
    Should,
}

/// Visitor over the structure of a source tree
pub trait SourceVisitor {
    /// Called once per term leaf
    fn consume_term(&mut self, field: &str, term: &str);

    /// Called when descending into a composite source
    fn enter(&mut self, _occur: Occur, _source: &IntervalsSource) {}
}

/// A query shape producing position intervals over one field
///
/// Construct through the factory functions in [`crate::intervals`], which
/// validate configuration up front.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalsSource {
    /// A single term occurrence
    Term(String),
    /// All children, in order, each strictly after its predecessor
    Ordered(Vec<IntervalsSource>),
    /// All children, in any order, within one enclosing window
    Unordered(Vec<IntervalsSource>),
    /// Any child
    Disjunction(Vec<IntervalsSource>),
    /// At least `min_should_match` of the children within one minimal window
    AtLeast {
        sources: Vec<IntervalsSource>,
        min_should_match: u32,
    },
}

impl IntervalsSource {
    /// Produce an interval iterator for this source over `field`
    ///
    /// Returns `Ok(None)` when the source is inapplicable to this context:
    /// the term does not occur, a conjunction is missing a child, or fewer
    /// than `min_should_match` children are applicable. Inapplicability
    /// means no document can match; it is not an error.
    pub fn intervals(
        &self,
        field: &str,
        ctx: &SearchContext,
    ) -> Result<Option<Box<dyn IntervalIterator>>> {
        match self {
            IntervalsSource::Term(term) => {
                let postings = match ctx.reader().term_positions(field, term)? {
                    Some(p) if !p.entries.is_empty() => p,
                    _ => return Ok(None),
                };
                Ok(Some(Box::new(TermIntervalIterator::new(postings.entries))))
            }
            IntervalsSource::Ordered(sources) => {
                match Self::all_sub_iterators(sources, field, ctx)? {
                    Some(subs) => Ok(Some(Box::new(OrderedIntervalIterator::new(subs)))),
                    None => Ok(None),
                }
            }
            IntervalsSource::Unordered(sources) => {
                match Self::all_sub_iterators(sources, field, ctx)? {
                    Some(subs) => Ok(Some(Box::new(UnorderedIntervalIterator::new(subs)))),
                    None => Ok(None),
                }
            }
            IntervalsSource::Disjunction(sources) => {
                let mut subs = Vec::new();
                for source in sources {
                    if let Some(it) = source.intervals(field, ctx)? {
                        subs.push(it);
                    }
                }
                if subs.is_empty() {
                    return Ok(None);
                }
                Ok(Some(Box::new(DisjunctionIntervalIterator::new(subs))))
            }
            IntervalsSource::AtLeast {
                sources,
                min_should_match,
            } => msm_intervals(sources, *min_should_match, field, ctx),
        }
    }

    /// Produce a matches iterator for this source against one document
    ///
    /// Returns `Ok(None)` when the document does not match. The returned
    /// iterator is unpositioned; call `next()` before the accessors.
    pub fn matches(
        &self,
        field: &str,
        ctx: &SearchContext,
        doc: u32,
    ) -> Result<Option<Box<dyn MatchesIterator>>> {
        match self {
            IntervalsSource::Term(term) => {
                let postings = match ctx.reader().term_positions(field, term)? {
                    Some(p) => p,
                    None => return Ok(None),
                };
                let entry = match postings.entry_for(doc) {
                    Some(e) => e,
                    None => return Ok(None),
                };
                Ok(Some(Box::new(TermMatchesIterator::new(
                    field,
                    entry,
                    self.clone(),
                ))))
            }
            IntervalsSource::Ordered(sources) => {
                conjunction_matches(ConjunctionKind::Ordered, sources, field, ctx, doc)
            }
            IntervalsSource::Unordered(sources) => {
                conjunction_matches(ConjunctionKind::Unordered, sources, field, ctx, doc)
            }
            IntervalsSource::Disjunction(sources) => {
                let mut subs = Vec::new();
                for source in sources {
                    if let Some(mi) = source.matches(field, ctx, doc)? {
                        subs.push(mi);
                    }
                }
                if subs.is_empty() {
                    return Ok(None);
                }
                Ok(Some(Box::new(DisjunctionMatchesIterator::new(subs))))
            }
            IntervalsSource::AtLeast {
                sources,
                min_should_match,
            } => msm_matches(sources, *min_should_match, field, ctx, doc),
        }
    }

    /// Structural lower bound on the width of any window this source reports
    pub fn min_extent(&self) -> u32 {
        match self {
            IntervalsSource::Term(_) => 1,
            IntervalsSource::Ordered(sources) | IntervalsSource::Unordered(sources) => {
                sources.iter().map(IntervalsSource::min_extent).sum()
            }
            IntervalsSource::Disjunction(sources) => sources
                .iter()
                .map(IntervalsSource::min_extent)
                .min()
                .unwrap_or(0),
            IntervalsSource::AtLeast {
                sources,
                min_should_match,
            } => {
                let mut extents: Vec<u32> =
                    sources.iter().map(IntervalsSource::min_extent).collect();
                extents.sort_unstable();
                extents.iter().take(*min_should_match as usize).sum()
            }
        }
    }

    /// Walk the source tree, reporting term leaves to `visitor`
    pub fn visit(&self, field: &str, visitor: &mut dyn SourceVisitor) {
        match self {
            IntervalsSource::Term(term) => visitor.consume_term(field, term),
            IntervalsSource::Ordered(sources) | IntervalsSource::Unordered(sources) => {
                visitor.enter(Occur::Must, self);
                for source in sources {
                    source.visit(field, visitor);
                }
            }
            IntervalsSource::Disjunction(sources)
            | IntervalsSource::AtLeast { sources, .. } => {
                visitor.enter(Occur::Should, self);
                for source in sources {
                    source.visit(field, visitor);
                }
            }
        }
    }

    /// Independent disjunctive branches this source can be split into for
    /// rewrite optimization
    ///
    /// Only top-level disjunctions decompose. `AtLeast` is a single
    /// indivisible unit: its k-of-n semantics cannot be expressed as
    /// independent OR branches.
    pub fn pull_up_disjunctions(&self) -> Vec<IntervalsSource> {
        match self {
            IntervalsSource::Disjunction(sources) => sources
                .iter()
                .flat_map(IntervalsSource::pull_up_disjunctions)
                .collect(),
            _ => vec![self.clone()],
        }
    }

    fn all_sub_iterators(
        sources: &[IntervalsSource],
        field: &str,
        ctx: &SearchContext,
    ) -> Result<Option<Vec<Box<dyn IntervalIterator>>>> {
        let mut subs = Vec::with_capacity(sources.len());
        for source in sources {
            match source.intervals(field, ctx)? {
                Some(it) => subs.push(it),
                None => return Ok(None),
            }
        }
        Ok(Some(subs))
    }
}

impl fmt::Display for IntervalsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, sources: &[IntervalsSource]) -> fmt::Result {
            for (i, source) in sources.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", source)?;
            }
            Ok(())
        }
        match self {
            IntervalsSource::Term(term) => write!(f, "{}", term),
            IntervalsSource::Ordered(sources) => {
                write!(f, "Ordered(")?;
                join(f, sources)?;
                write!(f, ")")
            }
            IntervalsSource::Unordered(sources) => {
                write!(f, "Unordered(")?;
                join(f, sources)?;
                write!(f, ")")
            }
            IntervalsSource::Disjunction(sources) => {
                write!(f, "or(")?;
                join(f, sources)?;
                write!(f, ")")
            }
            IntervalsSource::AtLeast {
                sources,
                min_should_match,
            } => {
                write!(f, "AtLeast(")?;
                join(f, sources)?;
                write!(f, "~{})", min_should_match)
            }
        }
    }
}

#[derive(Clone, Copy)]
enum ConjunctionKind {
    Ordered,
    Unordered,
}

fn conjunction_matches(
    kind: ConjunctionKind,
    sources: &[IntervalsSource],
    field: &str,
    ctx: &SearchContext,
    doc: u32,
) -> Result<Option<Box<dyn MatchesIterator>>> {
    let mut shims = Vec::with_capacity(sources.len());
    for source in sources {
        match source.matches(field, ctx, doc)? {
            Some(mi) => shims.push(Rc::new(RefCell::new(CachingMatchesIterator::new(field, mi)))),
            None => return Ok(None),
        }
    }
    let adapters: Vec<Box<dyn IntervalIterator>> = shims
        .iter()
        .map(|shim| {
            Box::new(MatchesIntervalAdapter::new(Rc::clone(shim), doc)) as Box<dyn IntervalIterator>
        })
        .collect();
    let mut iterator: Box<dyn IntervalIterator> = match kind {
        ConjunctionKind::Ordered => Box::new(OrderedIntervalIterator::new(adapters)),
        ConjunctionKind::Unordered => Box::new(UnorderedIntervalIterator::new(adapters)),
    };
    if iterator.advance(doc)? != doc {
        return Ok(None);
    }
    if iterator.next_interval()? == NO_MORE_INTERVALS {
        return Ok(None);
    }
    Ok(Some(Box::new(ConjunctionMatchesIterator::new(
        iterator, shims,
    ))))
}
