//! Structural snapshots: the sole exported representation of a chain.
//!
//! A snapshot lists the managed bounds and every segment's
//! `(start, end, owner)` triple in address order, covering the full range
//! with no gaps. It exists for serialization and debugging by external
//! collaborators; there is no binary wire format. See
//! [`RangeMap::snapshot`](crate::RangeMap::snapshot) and
//! [`RangeMap::from_snapshot`](crate::RangeMap::from_snapshot).

use serde::{Deserialize, Serialize};

/// Structural description of an entire chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot<O> {
    /// First managed position (inclusive).
    pub start: u64,
    /// Last managed position (inclusive).
    pub end: u64,
    /// All segments in address order; contiguous, jointly covering
    /// `[start, end]`.
    pub segments: Vec<SegmentSnapshot<O>>,
}

/// One segment's triple within a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSnapshot<O> {
    pub start: u64,
    pub end: u64,
    /// `None` marks a free segment.
    pub owner: Option<O>,
}
