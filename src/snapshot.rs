//! Normalized file-tree snapshots.
//!
//! A [`Snapshot`] is a point-in-time listing of one side of the check: every
//! regular file under a scan root, keyed by its relative path with `/`
//! separators. Snapshots come from a scanner run or from the on-disk cache
//! and are treated as immutable once produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which side of the check a snapshot describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Local,
    Remote,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Local => write!(f, "local"),
            Source::Remote => write!(f, "remote"),
        }
    }
}

/// One file in a snapshot. The relative path is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub relative_path: String,
    pub size_bytes: u64,
}

/// A named, timestamped listing of files from one source for one scan root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub source: Source,
    /// Local absolute path, a remote folder id, or the entire-drive sentinel.
    pub root_identifier: String,
    /// Keyed by `relative_path`; no two records share a key.
    pub records: HashMap<String, FileRecord>,
    pub generated_at: DateTime<Utc>,
    /// Per-file problems observed during the scan (unreadable entries,
    /// path collisions). Surfaced in the report, never fatal.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Snapshot {
    pub fn new(source: Source, root_identifier: impl Into<String>) -> Self {
        Self {
            source,
            root_identifier: root_identifier.into(),
            records: HashMap::new(),
            generated_at: Utc::now(),
            warnings: Vec::new(),
        }
    }

    /// Inserts a record. If the path is already present the later record
    /// wins and the collision is recorded as a warning.
    pub fn insert(&mut self, record: FileRecord) {
        if let Some(prev) = self
            .records
            .insert(record.relative_path.clone(), record)
        {
            self.warnings.push(format!(
                "duplicate path '{}': keeping the later entry",
                prev.relative_path
            ));
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Seconds since this snapshot was generated.
    pub fn age_secs(&self) -> u64 {
        (Utc::now() - self.generated_at).num_seconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_path_keeps_later_entry_and_warns() {
        let mut snap = Snapshot::new(Source::Remote, "folder-1");
        snap.insert(FileRecord {
            relative_path: "a/b.txt".into(),
            size_bytes: 10,
        });
        snap.insert(FileRecord {
            relative_path: "a/b.txt".into(),
            size_bytes: 20,
        });

        assert_eq!(snap.len(), 1);
        assert_eq!(snap.records["a/b.txt"].size_bytes, 20);
        assert_eq!(snap.warnings.len(), 1);
        assert!(snap.warnings[0].contains("a/b.txt"));
    }
}
