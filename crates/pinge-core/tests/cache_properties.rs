//! Property-based tests for cache reconciliation.
//!
//! Verifies the two load-bearing invariants under arbitrary interleavings of
//! fetch-page and live-merge operations:
//!
//! - Idempotent merge: re-applying any live event leaves the cache identical.
//! - Newest-first: the flattened sequence is non-increasing in timestamp and
//!   free of duplicate ids.

use std::collections::HashSet;

use pinge_core::{MergeOutcome, Message, MessageCache, DEFAULT_PAGE_SIZE};
use proptest::prelude::*;

/// Operations a conversation cache sees in production, relative to a shared
/// clock: live events always carry the globally newest message, fetched
/// pages always extend history backwards.
#[derive(Debug, Clone)]
enum CacheOp {
    /// A live event for a brand-new message.
    LiveNew,
    /// Redelivery of the nth-oldest already-known message.
    LiveDuplicate(usize),
    /// A backward fetch returning this many older messages.
    FetchPage(usize),
}

fn op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => Just(CacheOp::LiveNew),
        1 => (0usize..64).prop_map(CacheOp::LiveDuplicate),
        2 => (1usize..=DEFAULT_PAGE_SIZE).prop_map(CacheOp::FetchPage),
    ]
}

/// Message with a sortable synthetic timestamp derived from a sequence
/// number. Larger sequence = newer.
fn message(seq: u64) -> Message {
    Message {
        id: format!("m{seq}"),
        sender_id: "peer".to_string(),
        sender_name: None,
        content: String::new(),
        sent_at: format!("2026-08-28T00:00:00.{seq:09}Z"),
    }
}

/// Drive a cache through the ops, tracking which sequence numbers exist.
///
/// `newest` grows upward for live events; `oldest` grows downward for
/// fetched pages, so chronology matches the pagination contract.
fn run_ops(ops: &[CacheOp]) -> (MessageCache, Vec<u64>) {
    let mut cache = MessageCache::new(DEFAULT_PAGE_SIZE);
    let mut known: Vec<u64> = Vec::new();
    let mut newest: u64 = 1_000_000;
    let mut oldest: u64 = 1_000_000;

    for op in ops {
        match op {
            CacheOp::LiveNew => {
                newest += 1;
                let outcome = cache.merge_live(message(newest));
                assert_eq!(outcome, MergeOutcome::Merged);
                known.push(newest);
            },
            CacheOp::LiveDuplicate(index) => {
                if known.is_empty() {
                    continue;
                }
                let seq = known[index % known.len()];
                let outcome = cache.merge_live(message(seq));
                assert_eq!(outcome, MergeOutcome::Duplicate);
            },
            CacheOp::FetchPage(len) => {
                // Only fetch while the contract says more pages exist.
                if !cache.has_more() {
                    continue;
                }
                let page: Vec<Message> = (0..*len)
                    .map(|_| {
                        oldest -= 1;
                        known.push(oldest);
                        message(oldest)
                    })
                    .collect();
                cache.push_page(page);
            },
        }
    }

    (cache, known)
}

fn flattened_ids(cache: &MessageCache) -> Vec<String> {
    cache.iter_newest_first().map(|m| m.id.clone()).collect()
}

proptest! {
    #[test]
    fn flattened_sequence_is_newest_first(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let (cache, _) = run_ops(&ops);
        let timestamps: Vec<&str> =
            cache.iter_newest_first().map(|m| m.sent_at.as_str()).collect();
        for pair in timestamps.windows(2) {
            prop_assert!(pair[0] >= pair[1], "out of order: {} then {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn no_duplicate_ids_survive(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let (cache, _) = run_ops(&ops);
        let ids = flattened_ids(&cache);
        let unique: HashSet<&String> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn merge_is_idempotent(ops in prop::collection::vec(op_strategy(), 0..40), seq in 1u64..100) {
        let (mut cache, _) = run_ops(&ops);
        let candidate = 2_000_000 + seq;

        let _ = cache.merge_live(message(candidate));
        let after_once = flattened_ids(&cache);

        let outcome = cache.merge_live(message(candidate));
        prop_assert_eq!(outcome, MergeOutcome::Duplicate);
        prop_assert_eq!(flattened_ids(&cache), after_once);
    }

    #[test]
    fn offset_tracks_page_count(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let (cache, _) = run_ops(&ops);
        prop_assert_eq!(cache.next_offset(), cache.page_count() * DEFAULT_PAGE_SIZE);
    }
}
