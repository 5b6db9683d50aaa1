//! End-to-end interval query tests against an in-memory index

use proxidex::intervals::{self, IntervalIterator, MatchesIterator, SearchContext};
use proxidex::reader::MemoryIndex;
use proxidex::{IntervalsSource, NO_MORE_DOCS, NO_MORE_INTERVALS};
use std::sync::Arc;

fn ctx_for(texts: &[&str]) -> SearchContext {
    let mut index = MemoryIndex::new();
    for (doc, text) in texts.iter().enumerate() {
        index.index_text(doc as u32, "content", text);
    }
    SearchContext::new(Arc::new(index))
}

fn windows(it: &mut dyn IntervalIterator) -> Vec<(u32, u32, u32)> {
    let mut out = Vec::new();
    while it.next_interval().unwrap() != NO_MORE_INTERVALS {
        out.push((it.start(), it.end(), it.gaps()));
    }
    out
}

#[test]
fn test_at_least_window_sequence() {
    // a at 0 and 5, b at 1 and 6, c at 10
    let ctx = ctx_for(&["a b x x x a b x x x c"]);
    let source = intervals::at_least(
        vec![
            intervals::term("a"),
            intervals::term("b"),
            intervals::term("c"),
        ],
        2,
    );

    let mut it = source.intervals("content", &ctx).unwrap().unwrap();
    assert_eq!(it.next_doc().unwrap(), 0);
    assert_eq!(
        windows(it.as_mut()),
        vec![(0, 1, 0), (1, 5, 3), (5, 6, 0), (6, 10, 3)]
    );
    assert_eq!(it.next_doc().unwrap(), NO_MORE_DOCS);
}

#[test]
fn test_at_least_skips_docs_below_threshold() {
    let ctx = ctx_for(&["a x x", "x b a", "c x x"]);
    let source = intervals::at_least(
        vec![
            intervals::term("a"),
            intervals::term("b"),
            intervals::term("c"),
        ],
        2,
    );

    let mut it = source.intervals("content", &ctx).unwrap().unwrap();
    let mut matching = Vec::new();
    loop {
        let doc = it.next_doc().unwrap();
        if doc == NO_MORE_DOCS {
            break;
        }
        if it.next_interval().unwrap() != NO_MORE_INTERVALS {
            matching.push(doc);
        }
    }
    assert_eq!(matching, vec![1]);
}

#[test]
fn test_at_least_inapplicable_when_too_few_terms_exist() {
    let ctx = ctx_for(&["a x x"]);
    let source = intervals::at_least(
        vec![
            intervals::term("a"),
            intervals::term("missing"),
            intervals::term("absent"),
        ],
        2,
    );
    assert!(source.intervals("content", &ctx).unwrap().is_none());
}

#[test]
fn test_phrase_search() {
    let ctx = ctx_for(&[
        "the quick brown fox",
        "quick and brown",
        "so quick brown foxes",
    ]);
    let source = intervals::phrase("quick brown");

    let mut it = source.intervals("content", &ctx).unwrap().unwrap();
    assert_eq!(it.next_doc().unwrap(), 0);
    assert_eq!(windows(it.as_mut()), vec![(1, 2, 0)]);
    // doc 1 has both terms but not adjacent
    assert_eq!(it.next_doc().unwrap(), 1);
    assert_eq!(windows(it.as_mut()), vec![]);
    assert_eq!(it.next_doc().unwrap(), 2);
    assert_eq!(windows(it.as_mut()), vec![(1, 2, 0)]);
}

#[test]
fn test_unordered_near() {
    let ctx = ctx_for(&["brown quick fox"]);
    let source = intervals::unordered(vec![intervals::term("quick"), intervals::term("brown")]);

    let mut it = source.intervals("content", &ctx).unwrap().unwrap();
    it.next_doc().unwrap();
    assert_eq!(windows(it.as_mut()), vec![(0, 1, 0)]);
}

#[test]
fn test_disjunction_streams_all_clauses() {
    let ctx = ctx_for(&["a b a c"]);
    let source = intervals::or(vec![intervals::term("a"), intervals::term("c")]);

    let mut it = source.intervals("content", &ctx).unwrap().unwrap();
    it.next_doc().unwrap();
    assert_eq!(windows(it.as_mut()), vec![(0, 0, 0), (2, 2, 0), (3, 3, 0)]);
}

#[test]
fn test_nested_composition() {
    // at least two of: "quick brown", fox, lazy
    let ctx = ctx_for(&["quick brown dog jumps", "quick brown fox jumps"]);
    let source = intervals::at_least(
        vec![
            intervals::phrase("quick brown"),
            intervals::term("fox"),
            intervals::term("lazy"),
        ],
        2,
    );

    let mut it = source.intervals("content", &ctx).unwrap().unwrap();
    assert_eq!(it.next_doc().unwrap(), 0);
    assert_eq!(windows(it.as_mut()), vec![]);
    assert_eq!(it.next_doc().unwrap(), 1);
    assert_eq!(windows(it.as_mut()), vec![(0, 2, 0)]);
}

#[test]
fn test_advance_skips_documents() {
    let ctx = ctx_for(&["a b", "a b", "x y", "a b"]);
    let source = intervals::phrase("a b");

    let mut it = source.intervals("content", &ctx).unwrap().unwrap();
    assert_eq!(it.advance(2).unwrap(), 3);
    assert_eq!(windows(it.as_mut()), vec![(0, 1, 0)]);
    assert_eq!(it.next_doc().unwrap(), NO_MORE_DOCS);
}

#[test]
fn test_matches_highlighting_offsets() {
    let text = "search engines rank results fast";
    let ctx = ctx_for(&[text]);
    let source = intervals::at_least(
        vec![
            intervals::term("search"),
            intervals::term("rank"),
            intervals::term("missing"),
        ],
        2,
    );

    let mut mi = source.matches("content", &ctx, 0).unwrap().unwrap();
    assert!(mi.next().unwrap());
    let snippet = &text[mi.start_offset().unwrap() as usize..mi.end_offset().unwrap() as usize];
    assert_eq!(snippet, "search engines rank");
    assert!(!mi.next().unwrap());
}

#[test]
fn test_matches_expose_participating_terms() {
    let ctx = ctx_for(&["alpha beta gamma"]);
    let source = intervals::at_least(
        vec![
            intervals::term("alpha"),
            intervals::term("gamma"),
            intervals::term("missing"),
        ],
        2,
    );

    let mut mi = source.matches("content", &ctx, 0).unwrap().unwrap();
    assert!(mi.next().unwrap());

    let mut subs = mi.sub_matches().unwrap().expect("composite match");
    let mut terms = Vec::new();
    while subs.next().unwrap() {
        match subs.source() {
            Some(IntervalsSource::Term(t)) => terms.push(t),
            other => panic!("expected a term sub-match, got {:?}", other),
        }
    }
    assert_eq!(terms, vec!["alpha", "gamma"]);
}

#[test]
fn test_matches_none_for_non_matching_doc() {
    let ctx = ctx_for(&["alpha beta", "gamma delta"]);
    let source = intervals::at_least(
        vec![
            intervals::term("alpha"),
            intervals::term("beta"),
            intervals::term("gamma"),
        ],
        2,
    );

    assert!(source.matches("content", &ctx, 0).unwrap().is_some());
    assert!(source.matches("content", &ctx, 1).unwrap().is_none());
}

#[test]
fn test_phrase_matches_aggregate_offsets() {
    let text = "the quick brown fox";
    let ctx = ctx_for(&[text]);
    let source = intervals::phrase("quick brown");

    let mut mi = source.matches("content", &ctx, 0).unwrap().unwrap();
    assert!(mi.next().unwrap());
    assert_eq!((mi.start_position(), mi.end_position()), (1, 2));
    let snippet = &text[mi.start_offset().unwrap() as usize..mi.end_offset().unwrap() as usize];
    assert_eq!(snippet, "quick brown");
}

#[test]
fn test_query_serialization_round_trip() {
    let source = intervals::at_least(
        vec![
            intervals::phrase("quick brown"),
            intervals::term("fox"),
            intervals::or(vec![intervals::term("lazy"), intervals::term("sleepy")]),
        ],
        2,
    );
    let json = serde_json::to_string_pretty(&source).unwrap();
    let back: IntervalsSource = serde_json::from_str(&json).unwrap();
    assert_eq!(source, back);
}
