mod alloc_tests;

use crate::{RangeMap, SegmentId};

/// Asserts every structural invariant of a live chain: contiguity, ordering,
/// consistent back-links, and counters matching a full rescan.
#[track_caller]
fn verify_chain<O>(map: &RangeMap<O>) {
    assert!(map.is_initialized(), "chain must exist");
    let mut total = 0u64;
    let mut free_total = 0u64;
    let mut count = 0usize;
    let mut expected_start = map.start();
    let mut prev_id: Option<SegmentId> = None;
    for (id, segment) in map.segments() {
        assert!(segment.length() >= 1, "zero-length segment at {id:?}");
        assert_eq!(
            segment.start(),
            expected_start,
            "gap or overlap before {id:?}"
        );
        assert_eq!(segment.prev, prev_id, "broken back-link at {id:?}");
        total += segment.length();
        if segment.is_free() {
            free_total += segment.length();
        }
        count += 1;
        expected_start = segment.end() + 1;
        prev_id = Some(id);
    }
    assert_eq!(
        expected_start,
        map.end() + 1,
        "chain must cover the managed range"
    );
    assert_eq!(total, map.length(), "segment lengths must sum to the length");
    assert_eq!(free_total, map.unallocated(), "free lengths vs unallocated");
    assert_eq!(count, map.segment_count(), "segment counter");
}

/// The chain as `(start, end, owner)` triples in address order.
fn triples<O: Clone>(map: &RangeMap<O>) -> Vec<(u64, u64, Option<O>)> {
    map.segments()
        .map(|(_, segment)| (segment.start(), segment.end(), segment.owner().cloned()))
        .collect()
}
