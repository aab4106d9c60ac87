//! Owner-tagged contiguous range allocator.
//!
//! Manages a fixed inclusive integer range (port numbers, block indices,
//! memory offsets) as an ordered chain of non-overlapping segments, each
//! free or tagged with an owner value. Supports first-fit allocation of N
//! units, release of everything one owner holds, clearing an arbitrary
//! sub-range regardless of owners, and point/range ownership queries: the
//! structure underneath port managers, block allocators and resource-lease
//! trackers.
//!
//! # Example
//!
//! ```
//! use rangemap::RangeMap;
//!
//! let mut ports: RangeMap<&str> = RangeMap::new(0, 65534)?;
//! let web = ports.allocate(1000, "web")?;
//! assert_eq!(ports.segment(web[0]).unwrap().start(), 0);
//! assert_eq!(ports.owner_at(500)?, Some(&"web"));
//!
//! let freed = ports.deallocate(&"web")?;
//! assert_eq!(freed, 1000);
//! assert_eq!(ports.unallocated(), 65535);
//! # Ok::<(), rangemap::Error>(())
//! ```

pub mod error;
pub mod range_map;
pub mod segment;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use error::{Error, ErrorKind, Result};
pub use range_map::{RangeMap, RangeMapConfig, SegmentIter};
pub use segment::{Segment, SegmentId};
pub use snapshot::{SegmentSnapshot, Snapshot};
