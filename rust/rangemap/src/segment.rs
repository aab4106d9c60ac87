//! Segment nodes and the arena that owns their storage.
//!
//! The chain of a [`RangeMap`](crate::RangeMap) is a doubly-linked list of
//! [`Segment`] nodes. Nodes live in a [`SegmentArena`]: a slot vector indexed
//! by [`SegmentId`], with `next`/`prev` stored as ids instead of pointers.
//! Slots vacated by merges go onto a bounded free list and are handed back to
//! later node creation; when the list is empty (or at capacity on release),
//! the arena falls back to fresh slot construction.

use std::fmt;

/// Opaque handle to a segment in a [`RangeMap`](crate::RangeMap) chain.
///
/// Ids stay valid while the segment they name is part of the chain. A merge
/// releases the absorbed segment's slot, and the id may later be reissued for
/// a new segment; holders of old ids must not assume they still name the same
/// range after the map has been mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(u32);

impl SegmentId {
    pub(crate) fn from_index(index: usize) -> SegmentId {
        debug_assert!(index <= u32::MAX as usize);
        SegmentId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A maximal contiguous sub-range with one owner state.
///
/// Covers the inclusive positions `[start, end]`; `end` is derived from
/// `start` and `length`, so the three can never disagree. A segment with no
/// owner is free.
#[derive(Debug, Clone)]
pub struct Segment<O> {
    pub(crate) start: u64,
    pub(crate) length: u64,
    pub(crate) owner: Option<O>,
    pub(crate) next: Option<SegmentId>,
    pub(crate) prev: Option<SegmentId>,
}

impl<O> Segment<O> {
    /// First position covered by this segment (inclusive).
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last position covered by this segment (inclusive).
    pub fn end(&self) -> u64 {
        self.start + self.length - 1
    }

    /// Number of positions covered; always at least 1.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The owner tag, or `None` when the segment is free.
    pub fn owner(&self) -> Option<&O> {
        self.owner.as_ref()
    }

    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }
}

impl<O: fmt::Debug> fmt::Display for Segment<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Segment start={}, end={}, length={}, owner={}>",
            self.start,
            self.end(),
            self.length,
            match &self.owner {
                Some(owner) => format!("{owner:?}"),
                None => "free".to_string(),
            }
        )
    }
}

/// Slot storage for segment nodes, with bounded slot recycling.
///
/// `pool_capacity` bounds how many released slots are retained for reuse;
/// capacity 0 disables recycling. Recycling is invisible to callers beyond
/// the reuse of previously issued ids.
#[derive(Debug)]
pub(crate) struct SegmentArena<O> {
    slots: Vec<Option<Segment<O>>>,
    free: Vec<SegmentId>,
    pool_capacity: usize,
}

impl<O> SegmentArena<O> {
    pub(crate) fn new(pool_capacity: usize) -> SegmentArena<O> {
        SegmentArena {
            slots: Vec::new(),
            free: Vec::new(),
            pool_capacity,
        }
    }

    /// Creates a node, reusing a pooled slot when one is available.
    pub(crate) fn create(&mut self, start: u64, length: u64, owner: Option<O>) -> SegmentId {
        debug_assert!(length > 0, "segment length must be positive");
        let segment = Segment {
            start,
            length,
            owner,
            next: None,
            prev: None,
        };
        match self.free.pop() {
            Some(id) => {
                debug_assert!(self.slots[id.index()].is_none());
                self.slots[id.index()] = Some(segment);
                id
            }
            None => {
                self.slots.push(Some(segment));
                SegmentId::from_index(self.slots.len() - 1)
            }
        }
    }

    /// Vacates a slot, pooling the id for reuse while capacity remains.
    pub(crate) fn release(&mut self, id: SegmentId) {
        let slot = &mut self.slots[id.index()];
        debug_assert!(slot.is_some(), "releasing a vacant slot");
        *slot = None;
        if self.free.len() < self.pool_capacity {
            self.free.push(id);
        }
    }

    /// Drops all slots and pooled ids. Only sound once every node has been
    /// released.
    pub(crate) fn reset(&mut self) {
        debug_assert!(self.slots.iter().all(Option::is_none));
        self.slots.clear();
        self.free.clear();
    }

    pub(crate) fn get(&self, id: SegmentId) -> Option<&Segment<O>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Resolves an id that the chain invariant guarantees to be live.
    pub(crate) fn node(&self, id: SegmentId) -> &Segment<O> {
        self.slots[id.index()].as_ref().expect("stale segment id")
    }

    pub(crate) fn node_mut(&mut self, id: SegmentId) -> &mut Segment<O> {
        self.slots[id.index()].as_mut().expect("stale segment id")
    }

    pub(crate) fn recycles(&self) -> bool {
        self.pool_capacity > 0
    }

    #[cfg(test)]
    pub(crate) fn pooled(&self) -> usize {
        self.free.len()
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
