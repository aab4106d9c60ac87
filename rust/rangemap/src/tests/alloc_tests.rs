use super::{triples, verify_chain};
use crate::{ErrorKind, RangeMap};

#[test]
fn exact_fit_tags_the_free_segment_in_place() {
    let mut map: RangeMap<&str> = RangeMap::with_length(100).unwrap();
    let ids = map.allocate(100, "a").unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(map.segment_count(), 1);
    assert_eq!(map.unallocated(), 0);
    assert_eq!(triples(&map), vec![(0, 99, Some("a"))]);
    verify_chain(&map);
}

#[test]
fn short_request_splits_off_a_leading_piece() {
    let mut map: RangeMap<&str> = RangeMap::with_length(100).unwrap();
    let ids = map.allocate(10, "a").unwrap();
    assert_eq!(ids.len(), 1);
    let lead = map.segment(ids[0]).unwrap();
    assert_eq!((lead.start(), lead.end(), lead.length()), (0, 9, 10));
    assert_eq!(
        triples(&map),
        vec![(0, 9, Some("a")), (10, 99, None)],
        "owned piece followed by the free remainder"
    );
    assert_eq!(map.segment_count(), 2);
    assert_eq!(map.unallocated(), 90);
    verify_chain(&map);
}

#[test]
fn first_fit_packs_requests_in_address_order() {
    let mut map: RangeMap<&str> = RangeMap::new(0, 65534).unwrap();
    map.allocate(1000, "a").unwrap();
    map.allocate(1000, "b").unwrap();
    map.allocate(1000, "c").unwrap();
    assert_eq!(
        triples(&map),
        vec![
            (0, 999, Some("a")),
            (1000, 1999, Some("b")),
            (2000, 2999, Some("c")),
            (3000, 65534, None),
        ]
    );
    assert_eq!(map.unallocated(), 65535 - 3000);
    assert_eq!(map.segment_count(), 4);
    verify_chain(&map);
}

#[test]
fn zero_length_request_is_rejected() {
    let mut map: RangeMap<&str> = RangeMap::with_length(100).unwrap();
    assert_eq!(
        map.allocate(0, "a").unwrap_err().into_kind(),
        ErrorKind::InvalidLength { length: 0 }
    );
    verify_chain(&map);
}

#[test]
fn request_beyond_unallocated_is_rejected_up_front() {
    let mut map: RangeMap<&str> = RangeMap::with_length(10).unwrap();
    assert_eq!(
        map.allocate(11, "a").unwrap_err().into_kind(),
        ErrorKind::InsufficientSpace {
            requested: 11,
            available: 10
        }
    );
    verify_chain(&map);
}

#[test]
fn exhausting_the_map_drives_unallocated_to_zero() {
    let mut map: RangeMap<&str> = RangeMap::with_length(10).unwrap();
    map.allocate(10, "a").unwrap();
    assert_eq!(map.unallocated(), 0);
    assert_eq!(
        map.allocate(1, "b").unwrap_err().into_kind(),
        ErrorKind::InsufficientSpace {
            requested: 1,
            available: 0
        }
    );
    verify_chain(&map);
}

#[test]
fn allocation_fuses_adjacent_free_segments() {
    let mut map: RangeMap<&str> = RangeMap::with_length(100).unwrap();
    map.allocate(30, "a").unwrap();
    map.allocate(30, "b").unwrap();
    map.deallocate(&"a").unwrap();
    map.deallocate(&"b").unwrap();
    // Deallocation leaves the free run fragmented: [0,29], [30,59], [60,99].
    assert_eq!(map.segment_count(), 3);

    let ids = map.allocate(50, "c").unwrap();
    assert_eq!(ids.len(), 1, "one fused segment satisfies the request");
    assert_eq!(
        triples(&map),
        vec![(0, 49, Some("c")), (50, 59, None), (60, 99, None)]
    );
    assert_eq!(map.unallocated(), 50);
    verify_chain(&map);
}

#[test]
fn fusing_stops_exactly_at_the_requested_amount() {
    let mut map: RangeMap<&str> = RangeMap::with_length(20).unwrap();
    map.allocate(10, "a").unwrap();
    map.allocate(10, "b").unwrap();
    map.deallocate(&"a").unwrap();
    map.deallocate(&"b").unwrap();

    let ids = map.allocate(20, "c").unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(triples(&map), vec![(0, 19, Some("c"))]);
    assert_eq!(map.segment_count(), 1);
    assert_eq!(map.unallocated(), 0);
    verify_chain(&map);
}

#[test]
fn an_occupied_segment_splits_the_allocation_into_pieces() {
    let mut map: RangeMap<&str> = RangeMap::with_length(100).unwrap();
    map.allocate(10, "a").unwrap();
    map.allocate(10, "b").unwrap();
    map.allocate(10, "c").unwrap();
    map.deallocate(&"b").unwrap();
    // Free space: [10,19] walled off by "c", then [30,99].

    let ids = map.allocate(30, "d").unwrap();
    assert_eq!(ids.len(), 2, "the run across the wall is disjoint");
    let first = map.segment(ids[0]).unwrap();
    let second = map.segment(ids[1]).unwrap();
    assert_eq!((first.start(), first.end()), (10, 19));
    assert_eq!((second.start(), second.end()), (30, 49));
    assert_eq!(
        triples(&map),
        vec![
            (0, 9, Some("a")),
            (10, 19, Some("d")),
            (20, 29, Some("c")),
            (30, 49, Some("d")),
            (50, 99, None),
        ]
    );
    assert_eq!(map.unallocated(), 50);
    verify_chain(&map);
}

#[test]
fn deallocate_returns_the_per_owner_total() {
    let mut map: RangeMap<&str> = RangeMap::new(0, 100).unwrap();
    for i in 0..10 {
        let owner = if i % 2 == 0 { "a" } else { "b" };
        map.allocate(10, owner).unwrap();
        verify_chain(&map);
    }
    assert_eq!(map.segment_count(), 11);
    assert_eq!(map.unallocated(), 1);

    assert_eq!(map.deallocate(&"a").unwrap(), 50);
    verify_chain(&map);
    assert_eq!(map.deallocate(&"b").unwrap(), 50);
    verify_chain(&map);

    // No merging on deallocation: every freed piece stays its own segment.
    let free = map.segments_owned_by(None).unwrap();
    assert_eq!(free.len(), 11);
    assert_eq!(map.unallocated(), 101);
}

#[test]
fn deallocating_an_absent_owner_is_a_no_op() {
    let mut map: RangeMap<&str> = RangeMap::with_length(100).unwrap();
    map.allocate(10, "a").unwrap();
    let before = triples(&map);
    assert_eq!(map.deallocate(&"nobody").unwrap(), 0);
    assert_eq!(triples(&map), before);
    verify_chain(&map);
}

#[test]
fn deallocating_twice_finds_nothing_the_second_time() {
    let mut map: RangeMap<&str> = RangeMap::with_length(100).unwrap();
    map.allocate(25, "a").unwrap();
    assert_eq!(map.deallocate(&"a").unwrap(), 25);
    assert_eq!(map.deallocate(&"a").unwrap(), 0);
    verify_chain(&map);
}

#[test]
fn freed_space_is_reused_by_later_allocations() {
    let mut map: RangeMap<&str> = RangeMap::with_length(100).unwrap();
    map.allocate(40, "a").unwrap();
    map.allocate(60, "b").unwrap();
    map.deallocate(&"a").unwrap();

    let ids = map.allocate(40, "c").unwrap();
    assert_eq!(ids.len(), 1);
    let segment = map.segment(ids[0]).unwrap();
    assert_eq!((segment.start(), segment.end()), (0, 39));
    assert_eq!(map.unallocated(), 0);
    verify_chain(&map);
}
