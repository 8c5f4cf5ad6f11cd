//! Interval indexing for biobin.
//!
//! The [`AIList`] answers "which intervals contain this position" over closed
//! intervals; [`region_index::RegionIndex`] wraps one list per chromosome and
//! maps loci to the regions that contain them.
//!
//! ```rust
//! use biobin_overlaprs::{AIList, Overlapper, Interval};
//!
//! let intervals = vec![
//!     Interval { start: 100u32, end: 200, val: "gene1" },
//!     Interval { start: 150, end: 300, val: "gene2" },
//!     Interval { start: 400, end: 500, val: "gene3" },
//! ];
//!
//! let ailist = AIList::build(intervals);
//! assert_eq!(ailist.find(180, 250).len(), 2);
//! assert_eq!(ailist.find_point(400).count(), 1);
//! ```

/// Augmented Interval List implementation.
///
/// See [`AIList`] for details.
pub mod ailist;

/// Per-chromosome region lookup.
pub mod region_index;

/// Core traits for overlap operations.
///
/// See [`Overlapper`] for the main trait.
pub mod traits;

// re-exports
pub use self::ailist::AIList;
pub use self::region_index::{IntoRegionIndex, RegionIndex, RegionIndexBuilder};
pub use self::traits::{Interval, Overlapper};
