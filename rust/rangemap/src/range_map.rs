//! The range map: one contiguous span of units carved into owner-tagged
//! segments.
//!
//! Overview
//! - A [`RangeMap`] manages the fixed inclusive range `[start, end]` as an
//!   ordered, gap-free chain of [`Segment`]s, each either free or tagged with
//!   an owner value.
//! - Every operation walks the chain in address order and performs local
//!   surgery (split, merge) where needed; two aggregate counters (unallocated
//!   units, live segment count) are maintained alongside the structural
//!   change.
//! - Single-threaded by design: no operation suspends or blocks, and callers
//!   needing concurrent access must serialize externally.

use std::fmt;

use crate::{
    error::{Error, Result},
    segment::{Segment, SegmentArena, SegmentId},
    snapshot::{SegmentSnapshot, Snapshot},
};

/// Construction options for a [`RangeMap`].
///
/// `use_pool` retains slots vacated by merges on a bounded free list for
/// reuse by later splits; `pool_capacity` bounds that list. `defrag_after_clear`
/// makes [`RangeMap::clear`] coalesce free neighbors around the last segment
/// it freed.
#[derive(Debug, Clone)]
pub struct RangeMapConfig {
    pub use_pool: bool,
    pub pool_capacity: usize,
    pub defrag_after_clear: bool,
}

impl RangeMapConfig {
    /// Default bound on the number of recycled slots retained by the pool.
    pub const DEFAULT_POOL_CAPACITY: usize = 1000;

    pub fn new() -> RangeMapConfig {
        RangeMapConfig::default()
    }

    pub fn use_pool(mut self, use_pool: bool) -> Self {
        self.use_pool = use_pool;
        self
    }

    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn defrag_after_clear(mut self, defrag: bool) -> Self {
        self.defrag_after_clear = defrag;
        self
    }
}

impl Default for RangeMapConfig {
    fn default() -> RangeMapConfig {
        RangeMapConfig {
            use_pool: false,
            pool_capacity: Self::DEFAULT_POOL_CAPACITY,
            defrag_after_clear: false,
        }
    }
}

/// An allocator over a fixed contiguous range of integer units (ports, block
/// indices, offsets), tracking which sub-ranges are free and which belong to
/// whom.
///
/// Behavior
/// - `allocate` runs a first-fit sequential scan and may satisfy a request by
///   fusing a run of adjacent free segments; when allocated segments
///   interrupt the run, the result is several disjoint tagged segments whose
///   lengths sum to the request.
/// - `deallocate` releases everything tagged with one owner in a single pass,
///   without coalescing the freed segments.
/// - `clear` frees an arbitrary sub-range regardless of owners, splitting
///   boundary segments as needed, and optionally defragments around the last
///   segment it freed.
/// - `owner_at`, `segments_owned_by` and `validate_range` answer point,
///   per-owner and range-ownership queries.
///
/// Lifecycle
/// - A map is initialized exactly once between construction and [`destroy`];
///   a destroyed map can be re-initialized with fresh bounds via [`init`].
///
/// [`destroy`]: RangeMap::destroy
/// [`init`]: RangeMap::init
#[derive(Debug)]
pub struct RangeMap<O> {
    start: u64,
    end: u64,
    length: u64,
    unallocated: u64,
    segments: usize,
    head: Option<SegmentId>,
    arena: SegmentArena<O>,
    defrag_after_clear: bool,
}

impl<O> RangeMap<O> {
    /// Creates a map managing the inclusive range `[start, end]` with the
    /// default configuration.
    pub fn new(start: u64, end: u64) -> Result<RangeMap<O>> {
        Self::with_config(start, end, RangeMapConfig::default())
    }

    /// Creates a map managing `[0, length - 1]`.
    pub fn with_length(length: u64) -> Result<RangeMap<O>> {
        Self::with_length_and_config(length, RangeMapConfig::default())
    }

    pub fn with_config(start: u64, end: u64, config: RangeMapConfig) -> Result<RangeMap<O>> {
        let pool_capacity = if config.use_pool {
            config.pool_capacity
        } else {
            0
        };
        let mut map = RangeMap {
            start: 0,
            end: 0,
            length: 0,
            unallocated: 0,
            segments: 0,
            head: None,
            arena: SegmentArena::new(pool_capacity),
            defrag_after_clear: config.defrag_after_clear,
        };
        map.init(start, end)?;
        Ok(map)
    }

    pub fn with_length_and_config(length: u64, config: RangeMapConfig) -> Result<RangeMap<O>> {
        Self::with_config(0, length.saturating_sub(1), config)
    }

    /// Builds the initial all-free chain over `[start, end]`.
    ///
    /// Fails with `AlreadyInitialized` if a chain exists; a map may only be
    /// initialized once between construction (which initializes it) and
    /// [`destroy`](RangeMap::destroy). Fails with `InvalidBounds` unless
    /// `start < end < u64::MAX` (the upper exclusion keeps
    /// `length = end - start + 1` and successor arithmetic from overflowing).
    pub fn init(&mut self, start: u64, end: u64) -> Result<()> {
        if self.head.is_some() {
            return Err(Error::already_initialized());
        }
        if start >= end || end == u64::MAX {
            return Err(Error::invalid_bounds(start, end));
        }
        let length = end - start + 1;
        self.head = Some(self.arena.create(start, length, None));
        self.start = start;
        self.end = end;
        self.length = length;
        self.unallocated = length;
        self.segments = 1;
        Ok(())
    }

    /// Tears the chain down, releasing every node, and zeroes the bounds and
    /// counters. Fails with `AlreadyDestroyed` if there is no chain.
    pub fn destroy(&mut self) -> Result<()> {
        let mut cursor = Some(self.chain_head()?);
        while let Some(id) = cursor {
            cursor = self.arena.node(id).next;
            self.arena.release(id);
        }
        if !self.arena.recycles() {
            self.arena.reset();
        }
        self.head = None;
        self.start = 0;
        self.end = 0;
        self.length = 0;
        self.unallocated = 0;
        self.segments = 0;
        Ok(())
    }

    /// First managed position. Zero on a destroyed map.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last managed position (inclusive). Zero on a destroyed map.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Total number of managed units.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Units currently free, maintained incrementally by every operation.
    pub fn unallocated(&self) -> u64 {
        self.unallocated
    }

    /// Number of live segments in the chain.
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    pub fn is_initialized(&self) -> bool {
        self.head.is_some()
    }

    /// Resolves a segment handle. Returns `None` when the handle's slot is
    /// vacant (the segment was merged away).
    pub fn segment(&self, id: SegmentId) -> Option<&Segment<O>> {
        self.arena.get(id)
    }

    /// Iterates the chain in address order.
    pub fn segments(&self) -> SegmentIter<'_, O> {
        SegmentIter {
            map: self,
            cursor: self.head,
        }
    }

    /// Returns the owner at `position`, or `None` when the containing segment
    /// is free. Fails with `OutOfBounds` when `position` lies outside the
    /// managed range.
    pub fn owner_at(&self, position: u64) -> Result<Option<&O>> {
        let head = self.chain_head()?;
        if position < self.start || position > self.end {
            return Err(Error::out_of_bounds(position));
        }
        let mut cursor = Some(head);
        while let Some(id) = cursor {
            let node = self.arena.node(id);
            if position >= node.start && position <= node.end() {
                return Ok(node.owner.as_ref());
            }
            cursor = node.next;
        }
        unreachable!("corrupted chain: position {position} is in bounds but uncovered");
    }

    fn chain_head(&self) -> Result<SegmentId> {
        self.head.ok_or_else(Error::already_destroyed)
    }
}

impl<O: PartialEq> RangeMap<O> {
    /// Frees every segment tagged with `owner` in a single pass over the
    /// chain, returning the total number of units released. Freed neighbors
    /// are deliberately not merged, keeping the sweep free of structural
    /// surgery. An owner holding nothing yields 0 with the chain untouched.
    pub fn deallocate(&mut self, owner: &O) -> Result<u64> {
        let mut cursor = Some(self.chain_head()?);
        let mut freed = 0;
        while let Some(id) = cursor {
            let node = self.arena.node_mut(id);
            if node.owner.as_ref() == Some(owner) {
                freed += node.length;
                node.owner = None;
            }
            cursor = node.next;
        }
        self.unallocated += freed;
        Ok(freed)
    }

    /// Checks that `[start, end]` is held by `owner` (`None` checks for free
    /// space): returns `false` if any segment whose start position falls
    /// within `[start, end]` carries a different owner. Fails with
    /// `OutOfRange` when the bounds leave the managed range.
    ///
    /// Only segment start points are examined, not full coverage: a
    /// differently-owned segment that begins before `start` and extends into
    /// the range does not fail the check. Callers needing exact-range
    /// ownership must keep segment boundaries aligned with the queried
    /// bounds.
    pub fn validate_range(&self, owner: Option<&O>, start: u64, end: u64) -> Result<bool> {
        let head = self.chain_head()?;
        if start < self.start || end > self.end {
            return Err(Error::out_of_range(start, end));
        }
        let mut cursor = Some(head);
        while let Some(id) = cursor {
            let node = self.arena.node(id);
            if node.start >= start && node.start <= end && node.owner.as_ref() != owner {
                return Ok(false);
            }
            cursor = node.next;
        }
        Ok(true)
    }

    /// Collects the segments whose owner equals `owner`, in address order.
    /// `None` collects the free segments.
    pub fn segments_owned_by(&self, owner: Option<&O>) -> Result<Vec<SegmentId>> {
        let mut cursor = Some(self.chain_head()?);
        let mut result = Vec::new();
        while let Some(id) = cursor {
            let node = self.arena.node(id);
            if node.owner.as_ref() == owner {
                result.push(id);
            }
            cursor = node.next;
        }
        Ok(result)
    }
}

impl<O: Clone> RangeMap<O> {
    /// Allocates `length` contiguous-where-possible units and tags them with
    /// `owner`, returning the tagged segments in address order.
    ///
    /// First-fit: the scan starts at the head and skips occupied segments.
    /// The first free segment either fits exactly, is split so its leading
    /// piece fits, or (when too short) absorbs the free segments immediately
    /// following it, splitting the last one when it overshoots, until the
    /// accumulated piece matches the outstanding amount. An
    /// occupied segment stops the absorption; the piece built so far is
    /// tagged and the scan continues beyond the blocker, so the result can be
    /// several disjoint segments whose lengths sum to `length`.
    ///
    /// Fails with `InsufficientSpace` when `length` exceeds the unallocated
    /// total (the sole space pre-check) and with `InvalidLength` when
    /// `length` is 0. `unallocated` drops by `length` exactly once however
    /// many pieces were produced.
    pub fn allocate(&mut self, length: u64, owner: O) -> Result<Vec<SegmentId>> {
        if length == 0 {
            return Err(Error::invalid_length(length));
        }
        if length > self.unallocated {
            return Err(Error::insufficient_space(length, self.unallocated));
        }
        let mut remaining = length;
        let mut result = Vec::new();
        let mut cursor = self.head;
        while let Some(id) = cursor {
            if self.arena.node(id).owner.is_some() {
                cursor = self.arena.node(id).next;
                continue;
            }
            let free_len = self.arena.node(id).length;
            if remaining == free_len {
                self.arena.node_mut(id).owner = Some(owner.clone());
                result.push(id);
                remaining = 0;
                break;
            }
            if remaining < free_len {
                let lead = self.split_leading(id, remaining);
                self.arena.node_mut(lead).owner = Some(owner.clone());
                result.push(lead);
                remaining = 0;
                break;
            }
            // The free run starts short of the request: fuse the following
            // free segments into this one until the remainder is covered.
            remaining -= free_len;
            while remaining > 0 {
                let Some(next_id) = self.arena.node(id).next else {
                    break;
                };
                let next = self.arena.node(next_id);
                if next.owner.is_some() {
                    break;
                }
                if remaining >= next.length {
                    remaining -= next.length;
                    self.merge_with_next(id);
                } else {
                    let lead = self.split_leading(next_id, remaining);
                    debug_assert_eq!(self.arena.node(id).next, Some(lead));
                    self.merge_with_next(id);
                    remaining = 0;
                }
            }
            self.arena.node_mut(id).owner = Some(owner.clone());
            result.push(id);
            if remaining == 0 {
                break;
            }
            cursor = self.arena.node(id).next;
        }
        assert!(
            remaining == 0,
            "corrupted chain: {remaining} units unallocatable with {} marked free",
            self.unallocated
        );
        self.unallocated -= length;
        Ok(result)
    }

    /// Frees the sub-range `[start, end]` regardless of current owners and
    /// returns the number of units that were owned until now (already-free
    /// units in the range contribute nothing).
    ///
    /// Boundary segments are split so that exactly `[start, end]` changes
    /// state. A zero-length request (`end + 1 == start`) is a no-op returning
    /// 0; bounds outside the managed range fail with `OutOfRange`; an
    /// inverted range fails with `InvalidRange`.
    ///
    /// With `defrag_after_clear` set, the last segment this call freed is
    /// merged backward across its free predecessors and forward across its
    /// free successors. Coalescing is anchored to that one segment: a call
    /// that freed nothing leaves even fragmented free space in the range
    /// untouched.
    pub fn clear(&mut self, start: u64, end: u64) -> Result<u64> {
        let head = self.chain_head()?;
        if start < self.start || end > self.end {
            return Err(Error::out_of_range(start, end));
        }
        if end + 1 == start {
            return Ok(0);
        }
        if end < start {
            return Err(Error::invalid_range(start, end));
        }

        let mut freed = 0;
        let mut last_cleared: Option<SegmentId> = None;
        let mut cursor = Some(head);
        while let Some(id) = cursor {
            let (seg_start, seg_end) = {
                let node = self.arena.node(id);
                (node.start, node.end())
            };
            if seg_end < start {
                cursor = self.arena.node(id).next;
                continue;
            }
            if seg_start > end {
                break;
            }
            let target = match (start <= seg_start, end >= seg_end) {
                // Segment fully inside the cleared range: no split.
                (true, true) => id,
                // Cleared range fully interior: carve out the middle piece.
                (false, false) => self.split_range(id, start, end),
                // Segment straddles `start`: split off the part before it.
                (false, true) => self.split_range(id, start, seg_end),
                // Segment straddles `end`: split off the part after it.
                (true, false) => self.split_range(id, seg_start, end),
            };
            let node = self.arena.node_mut(target);
            if node.owner.is_some() {
                freed += node.length;
                node.owner = None;
                last_cleared = Some(target);
            }
            cursor = node.next;
        }

        if self.defrag_after_clear {
            if let Some(last) = last_cleared {
                let mut anchor = last;
                while let Some(prev_id) = self.arena.node(anchor).prev {
                    if self.arena.node(prev_id).owner.is_some() {
                        break;
                    }
                    self.merge_with_next(prev_id);
                    anchor = prev_id;
                }
                while let Some(next_id) = self.arena.node(anchor).next {
                    if self.arena.node(next_id).owner.is_some() {
                        break;
                    }
                    self.merge_with_next(anchor);
                }
            }
        }

        self.unallocated += freed;
        Ok(freed)
    }

    /// [`clear`](RangeMap::clear) from `start` through the end of the managed
    /// range.
    pub fn clear_from(&mut self, start: u64) -> Result<u64> {
        self.chain_head()?;
        self.clear(start, self.end)
    }

    /// Splits `len` units off the front of a segment. The new leading piece
    /// inherits the owner and takes the segment's place in the chain (and as
    /// head, when applicable); the original keeps the remainder.
    fn split_leading(&mut self, id: SegmentId, len: u64) -> SegmentId {
        let (start, owner, prev) = {
            let node = self.arena.node(id);
            assert!(
                len > 0 && len < node.length,
                "leading split of {len} units out of {}",
                node.length
            );
            (node.start, node.owner.clone(), node.prev)
        };
        let lead = self.arena.create(start, len, owner);
        {
            let node = self.arena.node_mut(id);
            node.start += len;
            node.length -= len;
            node.prev = Some(lead);
        }
        {
            let lead_node = self.arena.node_mut(lead);
            lead_node.prev = prev;
            lead_node.next = Some(id);
        }
        match prev {
            Some(prev_id) => self.arena.node_mut(prev_id).next = Some(lead),
            None => self.head = Some(lead),
        }
        self.segments += 1;
        lead
    }

    /// Splits a segment so that `[start, end]` becomes its own node (owner
    /// inherited on every piece) and returns that node. Expects a genuine
    /// sub-range: equal bounds on both sides is the caller's no-split case.
    fn split_range(&mut self, id: SegmentId, start: u64, end: u64) -> SegmentId {
        let (seg_start, seg_end) = {
            let node = self.arena.node(id);
            (node.start, node.end())
        };
        assert!(
            seg_start <= start && start <= end && end <= seg_end,
            "split range [{start}, {end}] outside segment [{seg_start}, {seg_end}]"
        );
        let len = end - start + 1;
        if start == seg_start {
            return self.split_leading(id, len);
        }
        if end == seg_end {
            // Trailing piece: the original keeps [seg_start, start - 1].
            let (owner, old_next) = {
                let node = self.arena.node(id);
                (node.owner.clone(), node.next)
            };
            let tail = self.arena.create(start, len, owner);
            {
                let node = self.arena.node_mut(id);
                node.length -= len;
                node.next = Some(tail);
            }
            {
                let tail_node = self.arena.node_mut(tail);
                tail_node.prev = Some(id);
                tail_node.next = old_next;
            }
            if let Some(next_id) = old_next {
                self.arena.node_mut(next_id).prev = Some(tail);
            }
            self.segments += 1;
            return tail;
        }
        // Interior piece: original keeps the lead, two new nodes follow.
        let (owner, old_next) = {
            let node = self.arena.node(id);
            (node.owner.clone(), node.next)
        };
        let mid = self.arena.create(start, len, owner.clone());
        let tail = self.arena.create(end + 1, seg_end - end, owner);
        {
            let node = self.arena.node_mut(id);
            node.length = start - seg_start;
            node.next = Some(mid);
        }
        {
            let mid_node = self.arena.node_mut(mid);
            mid_node.prev = Some(id);
            mid_node.next = Some(tail);
        }
        {
            let tail_node = self.arena.node_mut(tail);
            tail_node.prev = Some(mid);
            tail_node.next = old_next;
        }
        if let Some(next_id) = old_next {
            self.arena.node_mut(next_id).prev = Some(tail);
        }
        self.segments += 2;
        mid
    }

    /// Absorbs a segment's successor into it, releasing the successor's slot.
    fn merge_with_next(&mut self, id: SegmentId) {
        let next_id = self.arena.node(id).next.expect("merge requires a successor");
        let (next_len, next_next) = {
            let next = self.arena.node(next_id);
            debug_assert_eq!(self.arena.node(id).end() + 1, next.start);
            (next.length, next.next)
        };
        {
            let node = self.arena.node_mut(id);
            node.length += next_len;
            node.next = next_next;
        }
        if let Some(after) = next_next {
            self.arena.node_mut(after).prev = Some(id);
        }
        self.arena.release(next_id);
        self.segments -= 1;
    }
}

impl<O> fmt::Display for RangeMap<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<RangeMap start={}, end={}, length={}, unallocated={}, segments={}>",
            self.start, self.end, self.length, self.unallocated, self.segments
        )
    }
}

/// Iterator over `(id, segment)` pairs in address order.
///
/// This struct is created by [`RangeMap::segments`].
pub struct SegmentIter<'a, O> {
    map: &'a RangeMap<O>,
    cursor: Option<SegmentId>,
}

impl<'a, O> Iterator for SegmentIter<'a, O> {
    type Item = (SegmentId, &'a Segment<O>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = self.map.arena.node(id);
        self.cursor = node.next;
        Some((id, node))
    }
}

impl<O: Clone> RangeMap<O> {
    /// Captures the structural snapshot: the bounds plus every
    /// `(start, end, owner)` triple in address order, covering the full range
    /// with no gaps. Fails with `AlreadyDestroyed` on a torn-down map.
    pub fn snapshot(&self) -> Result<Snapshot<O>> {
        self.chain_head()?;
        let segments = self
            .segments()
            .map(|(_, node)| SegmentSnapshot {
                start: node.start(),
                end: node.end(),
                owner: node.owner().cloned(),
            })
            .collect();
        Ok(Snapshot {
            start: self.start,
            end: self.end,
            segments,
        })
    }
}

impl<O> RangeMap<O> {
    /// Rebuilds a map from a structural snapshot with the default
    /// configuration.
    pub fn from_snapshot(snapshot: Snapshot<O>) -> Result<RangeMap<O>> {
        Self::from_snapshot_with_config(snapshot, RangeMapConfig::default())
    }

    /// Rebuilds a map from a structural snapshot, restoring the chain and
    /// counters exactly. The input must describe a valid chain: ordered
    /// entries of positive length, contiguous from `snapshot.start` through
    /// `snapshot.end`; anything else fails with `InvalidSnapshot`.
    pub fn from_snapshot_with_config(
        snapshot: Snapshot<O>,
        config: RangeMapConfig,
    ) -> Result<RangeMap<O>> {
        if snapshot.start >= snapshot.end || snapshot.end == u64::MAX {
            return Err(Error::invalid_snapshot(format!(
                "bounds [{}, {}] cannot describe a managed range",
                snapshot.start, snapshot.end
            )));
        }
        if snapshot.segments.is_empty() {
            return Err(Error::invalid_snapshot("no segments"));
        }
        let mut expected = snapshot.start;
        for entry in &snapshot.segments {
            if entry.end < entry.start || entry.end > snapshot.end {
                return Err(Error::invalid_snapshot(format!(
                    "segment [{}, {}] is malformed or exceeds the bounds",
                    entry.start, entry.end
                )));
            }
            if entry.start != expected {
                return Err(Error::invalid_snapshot(format!(
                    "segment starting at {} breaks contiguity, expected {expected}",
                    entry.start
                )));
            }
            expected = entry.end + 1;
        }
        if expected != snapshot.end + 1 {
            return Err(Error::invalid_snapshot(format!(
                "segments stop at {} short of the end {}",
                expected - 1,
                snapshot.end
            )));
        }

        let pool_capacity = if config.use_pool {
            config.pool_capacity
        } else {
            0
        };
        let mut map = RangeMap {
            start: snapshot.start,
            end: snapshot.end,
            length: snapshot.end - snapshot.start + 1,
            unallocated: 0,
            segments: 0,
            head: None,
            arena: SegmentArena::new(pool_capacity),
            defrag_after_clear: config.defrag_after_clear,
        };
        let mut prev: Option<SegmentId> = None;
        for entry in snapshot.segments {
            let length = entry.end - entry.start + 1;
            if entry.owner.is_none() {
                map.unallocated += length;
            }
            let id = map.arena.create(entry.start, length, entry.owner);
            match prev {
                Some(prev_id) => {
                    map.arena.node_mut(prev_id).next = Some(id);
                    map.arena.node_mut(id).prev = Some(prev_id);
                }
                None => map.head = Some(id),
            }
            map.segments += 1;
            prev = Some(id);
        }
        Ok(map)
    }
}
