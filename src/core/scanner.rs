//! Local directory scanner.

use crate::error::{CheckError, Result};
use crate::snapshot::{FileRecord, Snapshot, Source};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Names excluded from a local scan.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    ignore_dirs: Vec<String>,
    file_patterns: Vec<Regex>,
}

impl ScanFilter {
    pub fn new(ignore_dirs: &[String], ignore_files: &[String]) -> Self {
        let file_patterns = ignore_files
            .iter()
            .filter_map(|pattern| Self::compile_pattern(pattern))
            .collect();
        Self {
            ignore_dirs: ignore_dirs.to_vec(),
            file_patterns,
        }
    }

    /// Compiles a `*` wildcard pattern into an anchored regex.
    fn compile_pattern(pattern: &str) -> Option<Regex> {
        let escaped = regex::escape(pattern).replace("\\*", ".*");
        Regex::new(&format!("^{escaped}$")).ok()
    }

    fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignore_dirs.iter().any(|d| d == name)
    }

    fn is_ignored_file(&self, name: &str) -> bool {
        self.file_patterns.iter().any(|re| re.is_match(name))
    }
}

impl Default for ScanFilter {
    fn default() -> Self {
        let dirs: Vec<String> = [".git", ".cache", "node_modules", "__pycache__", ".venv", "venv"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let files: Vec<String> = [".DS_Store", "Thumbs.db", "*.tmp", "*.swp"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self::new(&dirs, &files)
    }
}

/// Walks a directory tree and produces a snapshot of relative paths and
/// sizes. Sizes come from metadata only; file contents are never read.
pub struct LocalScanner {
    filter: ScanFilter,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl LocalScanner {
    pub fn new(filter: ScanFilter) -> Self {
        Self {
            filter,
            cancel_flag: None,
        }
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    /// Recursively enumerates regular files under `root`. Symbolic links are
    /// not followed, so cyclic links cannot loop the walk. Unreadable
    /// entries are skipped with a warning on the snapshot.
    pub async fn scan(&self, root: &Path) -> Result<Snapshot> {
        if !root.is_dir() {
            return Err(CheckError::scan(
                Source::Local,
                format!("not a directory: {}", root.display()),
            ));
        }

        let root: PathBuf = root.to_path_buf();
        let root_id = root.display().to_string();
        info!(root = %root_id, "scanning local tree");

        let filter = self.filter.clone();
        let cancel = self.cancel_flag.clone();

        // The walk is synchronous; keep it off the async runtime.
        let snapshot = tokio::task::spawn_blocking(move || {
            Self::walk(&root, root_id, &filter, cancel.as_deref())
        })
        .await
        .map_err(|e| CheckError::scan(Source::Local, format!("scan task failed: {e}")))??;

        info!(
            files = snapshot.len(),
            warnings = snapshot.warnings.len(),
            "local scan complete"
        );
        Ok(snapshot)
    }

    fn walk(
        root: &Path,
        root_id: String,
        filter: &ScanFilter,
        cancel: Option<&AtomicBool>,
    ) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new(Source::Local, root_id);
        let mut visited = 0usize;

        let walker = WalkDir::new(root).follow_links(false).into_iter();
        let mut walker = walker.filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !filter.is_ignored_dir(&name)
        });

        while let Some(entry) = walker.next() {
            visited += 1;
            if visited % 256 == 0 {
                if let Some(flag) = cancel {
                    if flag.load(Ordering::Relaxed) {
                        return Err(CheckError::Cancelled);
                    }
                }
            }

            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    snapshot.warn(format!("unreadable entry: {e}"));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if filter.is_ignored_file(&name) {
                debug!(path = %entry.path().display(), "excluded by filter");
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    snapshot.warn(format!("cannot stat {}: {e}", entry.path().display()));
                    continue;
                }
            };

            let relative = match entry.path().strip_prefix(root) {
                Ok(p) => p,
                Err(_) => continue,
            };
            let relative_path = normalize_separators(&relative.to_string_lossy());
            if relative_path.is_empty() {
                continue;
            }

            snapshot.insert(FileRecord {
                relative_path,
                size_bytes: metadata.len(),
            });
        }

        Ok(snapshot)
    }
}

impl Default for LocalScanner {
    fn default() -> Self {
        Self::new(ScanFilter::default())
    }
}

/// Paths compare across operating systems only with a canonical separator.
fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
