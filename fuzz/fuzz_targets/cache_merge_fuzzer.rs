//! Fuzz target for MessageCache merge/pagination interleavings
//!
//! Applies arbitrary interleavings of live merges and page appends, drawing
//! message ids from a small space so duplicate deliveries are common.
//!
//! # Invariants
//!
//! - No message id appears twice in the flattened sequence
//! - A duplicate merge leaves the cache byte-for-byte unchanged
//! - The continuation offset is always `page_count * page_size`

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pinge_core::{Message, MessageCache};

const PAGE_SIZE: usize = 4;

#[derive(Debug, Clone, Arbitrary)]
enum CacheOp {
    MergeLive { id: u8 },
    PushPage { ids: Vec<u8> },
}

fn message(id: u8) -> Message {
    Message {
        id: format!("m{id}"),
        sender_id: "peer".to_string(),
        sender_name: None,
        content: String::new(),
        sent_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

fuzz_target!(|ops: Vec<CacheOp>| {
    let mut cache = MessageCache::new(PAGE_SIZE);

    for op in ops {
        match op {
            CacheOp::MergeLive { id } => {
                let before: Vec<_> = cache.iter_newest_first().cloned().collect();
                let already_cached = cache.contains(&format!("m{id}"));
                cache.merge_live(message(id));

                if already_cached {
                    let after: Vec<_> = cache.iter_newest_first().cloned().collect();
                    assert_eq!(before, after, "duplicate merge mutated the cache");
                }
            }
            CacheOp::PushPage { ids } => {
                // Pages come from the REST layer, which never repeats ids
                // within or across pages; mirror that here.
                let mut page: Vec<Message> = Vec::new();
                for id in ids.into_iter().take(PAGE_SIZE) {
                    let key = format!("m{id}");
                    if cache.contains(&key) || page.iter().any(|m| m.id == key) {
                        continue;
                    }
                    page.push(message(id));
                }
                cache.push_page(page);
            }
        }

        let mut seen = HashSet::new();
        for msg in cache.iter_newest_first() {
            assert!(seen.insert(msg.id.clone()), "duplicate id {} in cache", msg.id);
        }
        assert_eq!(cache.next_offset(), cache.page_count() * PAGE_SIZE);
    }
});
