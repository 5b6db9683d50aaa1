//! Structural invariants of interval traversal
//!
//! These tests exercise the combinators over generated corpora and check the
//! properties every traversal must keep: forward-only ordering, window
//! well-formedness, and agreement between interval mode and matches mode.

use proxidex::intervals::{self, IntervalIterator, MatchesIterator, SearchContext};
use proxidex::reader::MemoryIndex;
use proxidex::{IntervalsSource, NO_MORE_DOCS, NO_MORE_INTERVALS};
use std::sync::Arc;

/// Deterministic corpus: a handful of docs with interleaved term positions
fn corpus() -> SearchContext {
    let mut index = MemoryIndex::new();
    let mut state = 0x2545f49u64;
    let mut next = |bound: u32| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) as u32) % bound
    };
    for doc in 0..20u32 {
        for (slot, term) in ["a", "b", "c", "d"].into_iter().enumerate() {
            // keep positions in per-term residue classes so no two terms
            // ever share a position
            let mut positions: Vec<u32> = (0..next(6)).map(|_| next(50) * 4 + slot as u32).collect();
            positions.sort_unstable();
            positions.dedup();
            if !positions.is_empty() {
                index.insert_positions(doc, "content", term, &positions);
            }
        }
    }
    SearchContext::new(Arc::new(index))
}

fn queries() -> Vec<IntervalsSource> {
    vec![
        intervals::term("a"),
        intervals::ordered(vec![intervals::term("a"), intervals::term("b")]),
        intervals::unordered(vec![intervals::term("a"), intervals::term("b")]),
        intervals::or(vec![intervals::term("a"), intervals::term("c")]),
        intervals::at_least(
            vec![
                intervals::term("a"),
                intervals::term("b"),
                intervals::term("c"),
                intervals::term("d"),
            ],
            2,
        ),
        intervals::at_least(
            vec![
                intervals::term("a"),
                intervals::term("b"),
                intervals::term("c"),
            ],
            1,
        ),
    ]
}

fn full_traversal(source: &IntervalsSource, ctx: &SearchContext) -> Vec<(u32, u32, u32, u32)> {
    let mut out = Vec::new();
    let Some(mut it) = source.intervals("content", ctx).unwrap() else {
        return out;
    };
    loop {
        let doc = it.next_doc().unwrap();
        if doc == NO_MORE_DOCS {
            break;
        }
        while it.next_interval().unwrap() != NO_MORE_INTERVALS {
            out.push((doc, it.start(), it.end(), it.gaps()));
        }
    }
    out
}

#[test]
fn test_windows_are_well_formed_and_ordered() {
    let ctx = corpus();
    for source in queries() {
        let rows = full_traversal(&source, &ctx);
        let mut prev: Option<(u32, u32)> = None;
        for (doc, start, end, gaps) in rows {
            assert!(end >= start, "{source}: end before start in doc {doc}");
            assert!(
                gaps <= end - start,
                "{source}: gaps exceed window looseness in doc {doc}"
            );
            if let Some((prev_doc, prev_start)) = prev {
                assert!(doc >= prev_doc, "{source}: docs went backwards");
                if doc == prev_doc {
                    assert!(
                        start >= prev_start,
                        "{source}: starts went backwards in doc {doc}"
                    );
                }
            }
            prev = Some((doc, start));
        }
    }
}

#[test]
fn test_traversal_is_deterministic() {
    let ctx = corpus();
    for source in queries() {
        assert_eq!(
            full_traversal(&source, &ctx),
            full_traversal(&source, &ctx),
            "{source}: two traversals disagree"
        );
    }
}

#[test]
fn test_at_least_one_agrees_with_disjunction_on_terms() {
    // with a threshold of one, every sub-interval becomes its own window
    let ctx = corpus();
    let subs = vec![
        intervals::term("a"),
        intervals::term("b"),
        intervals::term("c"),
    ];
    let threshold = full_traversal(&intervals::at_least(subs.clone(), 1), &ctx);
    let disjunction = full_traversal(&intervals::or(subs), &ctx);

    let spans: Vec<(u32, u32, u32)> = threshold.iter().map(|r| (r.0, r.1, r.2)).collect();
    let expected: Vec<(u32, u32, u32)> = disjunction.iter().map(|r| (r.0, r.1, r.2)).collect();
    assert_eq!(spans, expected);
    assert!(threshold.iter().all(|r| r.3 == 0), "term windows have no gaps");
}

#[test]
fn test_matches_replay_the_interval_stream() {
    let ctx = corpus();
    for source in queries() {
        let rows = full_traversal(&source, &ctx);
        let docs: Vec<u32> = {
            let mut d: Vec<u32> = rows.iter().map(|r| r.0).collect();
            d.dedup();
            d
        };
        for doc in docs {
            let expected: Vec<(u32, u32)> = rows
                .iter()
                .filter(|r| r.0 == doc)
                .map(|r| (r.1, r.2))
                .collect();
            let mut mi = source
                .matches("content", &ctx, doc)
                .unwrap()
                .unwrap_or_else(|| panic!("{source}: doc {doc} has windows but no matches"));
            let mut got = Vec::new();
            while mi.next().unwrap() {
                got.push((mi.start_position(), mi.end_position()));
            }
            assert_eq!(got, expected, "{source}: matches diverge in doc {doc}");
        }
    }
}

#[test]
fn test_advance_lands_on_the_same_docs() {
    let ctx = corpus();
    for source in queries() {
        let rows = full_traversal(&source, &ctx);
        let mut docs: Vec<u32> = rows.iter().map(|r| r.0).collect();
        docs.dedup();

        let Some(mut it) = source.intervals("content", &ctx).unwrap() else {
            continue;
        };
        for &doc in &docs {
            assert_eq!(it.advance(doc).unwrap(), doc, "{source}: advance missed {doc}");
        }
    }
}

#[test]
fn test_offsets_unavailable_error_names_the_field() {
    // insert_positions indexes without offsets
    let mut index = MemoryIndex::new();
    index.insert_positions(0, "content", "a", &[0]);
    index.insert_positions(0, "content", "b", &[1]);
    let ctx = SearchContext::new(Arc::new(index));

    let source = intervals::phrase("a b");
    let mut mi = source.matches("content", &ctx, 0).unwrap().unwrap();
    assert!(mi.next().unwrap());
    assert_eq!(mi.start_position(), 0);
    match mi.start_offset() {
        Err(proxidex::ProxidexError::OffsetsUnavailable(field)) => assert_eq!(field, "content"),
        other => panic!("expected OffsetsUnavailable, got {:?}", other.map(|_| ())),
    }
}
