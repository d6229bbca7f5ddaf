//! Duplicate detection: bounded-parallel hashing and digest grouping.
//!
//! - [`coordinator`]: fans hashing out to a fixed-size worker pool
//! - [`groups`]: groups hash results by digest and derives statistics
//! - [`finder`]: runs walking, filtering, hashing and grouping for one scan

pub mod coordinator;
pub mod finder;
pub mod groups;

pub use coordinator::{effective_workers, CoordinatorReport, HashingCoordinator};
pub use finder::{DuplicateFinder, FinderError, ScanReport, ScanSummary};
pub use groups::{group_results, DuplicateGroup, DuplicateGrouper, DuplicateStats, Grouping};
