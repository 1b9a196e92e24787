//! Snapshot cache.
//!
//! One JSON file per `(source, root identifier)` pair under an explicitly
//! configured directory. Writes go through a temp file and an atomic rename,
//! so a crash mid-store leaves either the previous entry or none. The cache
//! never expires entries on its own; freshness is the caller's policy.

use crate::error::{CheckError, Result};
use crate::snapshot::{Snapshot, Source};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

const ENTRY_SUFFIX: &str = ".snap.json";

pub struct SnapshotCache {
    cache_dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        let _ = fs::create_dir_all(&cache_dir);
        Self { cache_dir }
    }

    /// Root identifiers can be arbitrary paths or ids; hash them into a
    /// filesystem-safe name.
    fn entry_path(&self, source: Source, root_identifier: &str) -> PathBuf {
        let digest = blake3::hash(root_identifier.as_bytes());
        self.cache_dir
            .join(format!("{source}_{}{ENTRY_SUFFIX}", &digest.to_hex()[..16]))
    }

    /// Returns the stored snapshot for this key, or `None` if never stored,
    /// explicitly cleared, or unreadable. A corrupt entry is removed and
    /// treated as a miss, never as an error.
    pub fn load(&self, source: Source, root_identifier: &str) -> Option<Snapshot> {
        let path = self.entry_path(source, root_identifier);
        let data = fs::read(&path).ok()?;

        let snapshot: Snapshot = match serde_json::from_slice(&data) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache entry, discarding");
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        // Guard against key collisions and stale file reuse.
        if snapshot.source != source || snapshot.root_identifier != root_identifier {
            warn!(path = %path.display(), "cache entry does not match its key, discarding");
            let _ = fs::remove_file(&path);
            return None;
        }

        info!(
            source = %source,
            files = snapshot.len(),
            age_secs = snapshot.age_secs(),
            "loaded snapshot from cache"
        );
        Some(snapshot)
    }

    /// Overwrites any prior entry for the snapshot's key.
    pub fn store(&self, snapshot: &Snapshot) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| CheckError::Cache(format!("cannot create cache dir: {e}")))?;

        let path = self.entry_path(snapshot.source, &snapshot.root_identifier);
        let data = serde_json::to_vec(snapshot)
            .map_err(|e| CheckError::Cache(format!("serialize failed: {e}")))?;

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, data)
            .map_err(|e| CheckError::Cache(format!("write failed: {e}")))?;
        fs::rename(&tmp_path, &path)
            .map_err(|e| CheckError::Cache(format!("rename failed: {e}")))?;

        info!(
            source = %snapshot.source,
            files = snapshot.len(),
            path = %path.display(),
            "snapshot cached"
        );
        Ok(())
    }

    /// Removes the entry for one key, if present.
    pub fn invalidate(&self, source: Source, root_identifier: &str) {
        let _ = fs::remove_file(self.entry_path(source, root_identifier));
    }

    /// Removes every cache entry.
    pub fn invalidate_all(&self) {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().ends_with(ENTRY_SUFFIX) {
                let _ = fs::remove_file(entry.path());
            }
        }
        info!("cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FileRecord;

    fn sample(source: Source, root: &str) -> Snapshot {
        let mut snap = Snapshot::new(source, root);
        snap.insert(FileRecord {
            relative_path: "a/b.txt".into(),
            size_bytes: 11,
        });
        snap.insert(FileRecord {
            relative_path: "c.txt".into(),
            size_bytes: 22,
        });
        snap
    }

    #[test]
    fn store_then_load_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().to_path_buf());
        let snap = sample(Source::Local, "/data");

        cache.store(&snap).unwrap();
        let loaded = cache.load(Source::Local, "/data").unwrap();

        assert_eq!(loaded.records, snap.records);
        assert_eq!(loaded.root_identifier, "/data");
        assert_eq!(loaded.source, Source::Local);
    }

    #[test]
    fn missing_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().to_path_buf());
        assert!(cache.load(Source::Remote, "folder-x").is_none());
    }

    #[test]
    fn corrupt_entry_is_removed_and_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().to_path_buf());
        let snap = sample(Source::Remote, "folder-x");
        cache.store(&snap).unwrap();

        let path = cache.entry_path(Source::Remote, "folder-x");
        std::fs::write(&path, b"{not json").unwrap();

        assert!(cache.load(Source::Remote, "folder-x").is_none());
        assert!(!path.exists());
    }

    #[test]
    fn entries_are_keyed_by_source_and_root() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().to_path_buf());
        cache.store(&sample(Source::Local, "/data")).unwrap();

        assert!(cache.load(Source::Remote, "/data").is_none());
        assert!(cache.load(Source::Local, "/other").is_none());
    }

    #[test]
    fn invalidate_removes_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().to_path_buf());
        cache.store(&sample(Source::Local, "/data")).unwrap();
        cache.store(&sample(Source::Remote, "folder-x")).unwrap();

        cache.invalidate(Source::Local, "/data");

        assert!(cache.load(Source::Local, "/data").is_none());
        assert!(cache.load(Source::Remote, "folder-x").is_some());
    }

    #[test]
    fn invalidate_all_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().to_path_buf());
        cache.store(&sample(Source::Local, "/data")).unwrap();
        cache.store(&sample(Source::Remote, "folder-x")).unwrap();

        cache.invalidate_all();

        assert!(cache.load(Source::Local, "/data").is_none());
        assert!(cache.load(Source::Remote, "folder-x").is_none());
    }
}
