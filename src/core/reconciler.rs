//! Snapshot reconciliation.
//!
//! Pure set arithmetic over the two snapshots' key sets: O(|L| + |R|) with
//! hash-map membership, no I/O, no hidden state. Detail lists come back
//! sorted so reports are deterministic regardless of scan order.

use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

/// A path present on both sides with different sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeMismatch {
    pub relative_path: String,
    pub local_size: u64,
    pub remote_size: u64,
}

/// Outcome of one reconciliation run. `only_local`, `only_remote`,
/// `size_mismatch`, and the matching count partition the union of both key
/// sets: every path lands in exactly one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub only_local: Vec<String>,
    pub only_remote: Vec<String>,
    pub size_mismatch: Vec<SizeMismatch>,
    /// Paths present on both sides with equal sizes.
    pub in_both_matching: u64,
    pub total_local: u64,
    pub total_remote: u64,
}

impl ComparisonResult {
    /// True when both sides hold exactly the same paths and sizes.
    pub fn is_clean(&self) -> bool {
        self.only_local.is_empty()
            && self.only_remote.is_empty()
            && self.size_mismatch.is_empty()
    }
}

pub fn reconcile(local: &Snapshot, remote: &Snapshot) -> ComparisonResult {
    let mut only_local = Vec::new();
    let mut only_remote = Vec::new();
    let mut size_mismatch = Vec::new();
    let mut in_both_matching = 0u64;

    for (path, record) in &local.records {
        match remote.records.get(path) {
            None => only_local.push(path.clone()),
            Some(remote_record) if remote_record.size_bytes != record.size_bytes => {
                size_mismatch.push(SizeMismatch {
                    relative_path: path.clone(),
                    local_size: record.size_bytes,
                    remote_size: remote_record.size_bytes,
                });
            }
            Some(_) => in_both_matching += 1,
        }
    }

    for path in remote.records.keys() {
        if !local.records.contains_key(path) {
            only_remote.push(path.clone());
        }
    }

    only_local.sort_unstable();
    only_remote.sort_unstable();
    size_mismatch.sort_unstable_by(|a, b| a.relative_path.cmp(&b.relative_path));

    ComparisonResult {
        only_local,
        only_remote,
        size_mismatch,
        in_both_matching,
        total_local: local.records.len() as u64,
        total_remote: remote.records.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{FileRecord, Source};

    fn snapshot(source: Source, files: &[(&str, u64)]) -> Snapshot {
        let mut snap = Snapshot::new(source, "test-root");
        for (path, size) in files {
            snap.insert(FileRecord {
                relative_path: path.to_string(),
                size_bytes: *size,
            });
        }
        snap
    }

    #[test]
    fn files_missing_on_either_side_are_reported() {
        let local = snapshot(Source::Local, &[("a.txt", 100), ("b.txt", 200)]);
        let remote = snapshot(Source::Remote, &[("a.txt", 100), ("c.txt", 50)]);

        let result = reconcile(&local, &remote);

        assert_eq!(result.only_local, vec!["b.txt"]);
        assert_eq!(result.only_remote, vec!["c.txt"]);
        assert!(result.size_mismatch.is_empty());
        assert_eq!(result.in_both_matching, 1);
        assert_eq!(result.total_local, 2);
        assert_eq!(result.total_remote, 2);
    }

    #[test]
    fn size_differences_carry_both_sizes() {
        let local = snapshot(Source::Local, &[("a.txt", 100)]);
        let remote = snapshot(Source::Remote, &[("a.txt", 150)]);

        let result = reconcile(&local, &remote);

        assert!(result.only_local.is_empty());
        assert!(result.only_remote.is_empty());
        assert_eq!(
            result.size_mismatch,
            vec![SizeMismatch {
                relative_path: "a.txt".into(),
                local_size: 100,
                remote_size: 150,
            }]
        );
        assert_eq!(result.in_both_matching, 0);
    }

    #[test]
    fn identical_snapshots_reconcile_clean() {
        let files = &[("a.txt", 1), ("d/e.txt", 2), ("f.txt", 3)];
        let local = snapshot(Source::Local, files);
        let remote = snapshot(Source::Remote, files);

        let result = reconcile(&local, &remote);

        assert!(result.is_clean());
        assert_eq!(result.in_both_matching, 3);
    }

    #[test]
    fn swapping_roles_swaps_the_only_sets() {
        let a = snapshot(Source::Local, &[("x", 1), ("y", 2), ("shared", 5)]);
        let b = snapshot(Source::Remote, &[("z", 3), ("shared", 5)]);

        let forward = reconcile(&a, &b);
        let reverse = reconcile(&b, &a);

        assert_eq!(forward.only_local, reverse.only_remote);
        assert_eq!(forward.only_remote, reverse.only_local);
        assert_eq!(forward.in_both_matching, reverse.in_both_matching);
    }

    #[test]
    fn every_local_path_lands_in_exactly_one_bucket() {
        let local = snapshot(
            Source::Local,
            &[("a", 1), ("b", 2), ("c", 3), ("d", 4)],
        );
        let remote = snapshot(Source::Remote, &[("b", 2), ("c", 99), ("e", 5)]);

        let result = reconcile(&local, &remote);

        let bucketed = result.only_local.len()
            + result.size_mismatch.len()
            + result.in_both_matching as usize;
        assert_eq!(bucketed as u64, result.total_local);

        for path in &result.only_local {
            assert!(!result
                .size_mismatch
                .iter()
                .any(|m| &m.relative_path == path));
            assert!(!result.only_remote.contains(path));
        }
    }

    #[test]
    fn detail_lists_are_sorted() {
        let local = snapshot(Source::Local, &[("z", 1), ("a", 1), ("m", 1)]);
        let remote = snapshot(Source::Remote, &[]);

        let result = reconcile(&local, &remote);
        assert_eq!(result.only_local, vec!["a", "m", "z"]);
    }
}
