//! Digest-keyed grouping of hash results.
//!
//! # Overview
//!
//! [`DuplicateGrouper`] consumes [`HashResult`]s in arrival order and builds a
//! mapping from digest to the paths that produced it. Failed results never
//! enter a group; they are kept aside as failures. [`DuplicateGrouper::finish`]
//! drops every group with a single member.
//!
//! Groups come out in the order their digest first arrived, and members in
//! the order their results arrived. With more than one hashing worker that
//! is completion order, not traversal order.
//!
//! # Example
//!
//! ```
//! use dupefinder::duplicates::DuplicateGrouper;
//! use dupefinder::scanner::HashResult;
//! use std::path::PathBuf;
//!
//! let mut grouper = DuplicateGrouper::new();
//! grouper.push(HashResult::success(PathBuf::from("/a.txt"), [1; 32]));
//! grouper.push(HashResult::success(PathBuf::from("/b.txt"), [1; 32]));
//! grouper.push(HashResult::success(PathBuf::from("/c.txt"), [2; 32]));
//!
//! let grouping = grouper.finish();
//! assert_eq!(grouping.groups.len(), 1);
//! assert_eq!(grouping.groups[0].files.len(), 2);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use serde::Serialize;

use crate::scanner::{hash_to_hex, Hash, HashError, HashResult};

/// Files sharing one content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// BLAKE3 hash of the file content
    pub hash: Hash,
    /// Member paths in arrival order; the first is the keeper
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(hash: Hash, files: Vec<PathBuf>) -> Self {
        Self { hash, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Digest as lowercase hex.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// The member kept when duplicates are removed.
    #[must_use]
    pub fn keeper(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }

    /// Every member except the keeper.
    #[must_use]
    pub fn duplicates(&self) -> &[PathBuf] {
        self.files.get(1..).unwrap_or(&[])
    }

    /// Number of duplicate copies (total - 1 keeper).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Current on-disk size of every member, `None` where unreadable.
    #[must_use]
    pub fn member_sizes(&self) -> Vec<Option<u64>> {
        self.files.iter().map(|p| file_size(p)).collect()
    }
}

/// Read a file's current size, `None` if it cannot be stat'ed.
#[must_use]
pub fn file_size(path: &Path) -> Option<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Some(meta.len()),
        Err(e) => {
            log::warn!("Cannot read size of {}: {}", path.display(), e);
            None
        }
    }
}

/// Final grouping of one scan.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    /// Groups with two or more members, in first-arrival order
    pub groups: Vec<DuplicateGroup>,
    /// Every hash failure, in arrival order
    pub failures: Vec<HashError>,
    /// Number of files hashed successfully
    pub hashed: usize,
}

/// Accumulates hash results into digest groups.
#[derive(Debug, Default)]
pub struct DuplicateGrouper {
    index: HashMap<Hash, usize>,
    groups: Vec<DuplicateGroup>,
    failures: Vec<HashError>,
    hashed: usize,
}

impl DuplicateGrouper {
    /// Create an empty grouper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one hash result.
    pub fn push(&mut self, result: HashResult) {
        match result.outcome {
            Ok(hash) => {
                self.hashed += 1;
                match self.index.get(&hash) {
                    Some(&i) => self.groups[i].files.push(result.path),
                    None => {
                        self.index.insert(hash, self.groups.len());
                        self.groups.push(DuplicateGroup::new(hash, vec![result.path]));
                    }
                }
            }
            Err(error) => self.failures.push(error),
        }
    }

    /// Drop single-member groups and return the final grouping.
    #[must_use]
    pub fn finish(self) -> Grouping {
        let groups: Vec<_> = self.groups.into_iter().filter(|g| g.len() > 1).collect();
        log::debug!(
            "Grouping complete: {} digests with duplicates out of {} hashed files",
            groups.len(),
            self.hashed
        );
        Grouping {
            groups,
            failures: self.failures,
            hashed: self.hashed,
        }
    }
}

impl Extend<HashResult> for DuplicateGrouper {
    fn extend<T: IntoIterator<Item = HashResult>>(&mut self, iter: T) {
        for result in iter {
            self.push(result);
        }
    }
}

/// Group a complete sequence of hash results.
#[must_use]
pub fn group_results<I: IntoIterator<Item = HashResult>>(results: I) -> Grouping {
    let mut grouper = DuplicateGrouper::new();
    grouper.extend(results);
    grouper.finish()
}

/// Aggregate statistics over a final grouping.
///
/// Sizes are read from the filesystem when the statistics are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateStats {
    /// Number of duplicate groups
    pub group_count: usize,
    /// Members of all groups, keepers included
    pub duplicate_files: usize,
    /// Files removable while keeping one copy per group
    pub removable_files: usize,
    /// Bytes freed by removing every non-keeper
    pub reclaimable_bytes: u64,
    /// Members whose size could not be read (counted as 0 bytes)
    pub unreadable_sizes: usize,
}

impl DuplicateStats {
    /// Compute statistics for `groups`, stat'ing every member.
    #[must_use]
    pub fn compute(groups: &[DuplicateGroup]) -> Self {
        let mut stats = Self {
            group_count: groups.len(),
            ..Self::default()
        };

        for group in groups {
            stats.duplicate_files += group.len();
            stats.removable_files += group.duplicate_count();

            let sizes = group.member_sizes();
            stats.unreadable_sizes += sizes.iter().filter(|s| s.is_none()).count();
            let total: u64 = sizes.iter().map(|s| s.unwrap_or(0)).sum();
            let keeper = sizes.first().copied().flatten().unwrap_or(0);
            stats.reclaimable_bytes += total.saturating_sub(keeper);
        }

        stats
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_bytes).to_string()
    }
}
