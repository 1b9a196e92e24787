//! Run configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Tunables that rarely change between runs. Loaded from an optional JSON
/// config file; every field falls back to its default when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tunables {
    /// Maximum usable age of a cached snapshot in seconds, 0 = no limit.
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
    /// Listing page size, capped at the API maximum.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Bound on concurrently outstanding remote listing calls.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,
    #[serde(default = "default_ignore_files")]
    pub ignore_files: Vec<String>,
}

fn default_cache_max_age_secs() -> u64 {
    86_400
}

fn default_page_size() -> usize {
    crate::drive::MAX_PAGE_SIZE
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_max_in_flight() -> usize {
    4
}

fn default_ignore_dirs() -> Vec<String> {
    [".git", ".cache", "node_modules", "__pycache__", ".venv", "venv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_ignore_files() -> Vec<String> {
    [".DS_Store", "Thumbs.db", "*.tmp", "*.swp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            cache_max_age_secs: default_cache_max_age_secs(),
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_in_flight: default_max_in_flight(),
            ignore_dirs: default_ignore_dirs(),
            ignore_files: default_ignore_files(),
        }
    }
}

impl Tunables {
    /// Loads tunables from a JSON file, falling back to defaults when the
    /// file is missing or unparsable.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(tunables) => tunables,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

/// Everything one check run needs.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub local_root: PathBuf,
    /// `None` scans the entire drive.
    pub remote_folder: Option<String>,
    pub cache_dir: PathBuf,
    pub output: PathBuf,
    /// Skip cache reads and always rescan.
    pub bypass_cache: bool,
    /// Drop every cache entry before the run.
    pub clear_cache: bool,
    pub tunables: Tunables,
}

impl CheckConfig {
    pub fn new(local_root: impl Into<PathBuf>) -> Self {
        Self {
            local_root: local_root.into(),
            remote_folder: None,
            cache_dir: PathBuf::from(".cache"),
            output: PathBuf::from("report.json"),
            bypass_cache: false,
            clear_cache: false,
            tunables: Tunables::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let tunables = Tunables::load(Path::new("/no/such/config.json"));
        assert_eq!(tunables.page_size, crate::drive::MAX_PAGE_SIZE);
        assert_eq!(tunables.max_retries, 3);
    }

    #[test]
    fn partial_config_file_keeps_defaults_for_absent_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"page_size": 100, "max_retries": 7}"#).unwrap();

        let tunables = Tunables::load(&path);
        assert_eq!(tunables.page_size, 100);
        assert_eq!(tunables.max_retries, 7);
        assert_eq!(tunables.max_in_flight, 4);
        assert!(tunables.ignore_dirs.contains(&".git".to_string()));
    }

    #[test]
    fn invalid_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{broken").unwrap();

        let tunables = Tunables::load(&path);
        assert_eq!(tunables.max_retries, 3);
    }
}
