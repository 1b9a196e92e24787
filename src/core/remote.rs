//! Remote tree scanner.
//!
//! Traverses the folder graph of the remote store through the paginated
//! listing API and produces a snapshot of relative paths and sizes. The
//! traversal is an explicit worklist of pending folders rather than native
//! recursion, so depth is not bounded by the call stack, and at most
//! `max_in_flight` folder listings are outstanding at once.

use crate::drive::{DriveClient, ListPage, ENTIRE_DRIVE, MAX_PAGE_SIZE};
use crate::error::{CheckError, Result};
use crate::snapshot::{FileRecord, Snapshot, Source};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Scope of a remote scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRoot {
    /// The whole drive, starting at its top-level folder.
    EntireDrive,
    /// One folder and everything transitively nested under it.
    Folder(String),
}

impl RemoteRoot {
    pub fn from_folder(folder_id: Option<String>) -> Self {
        match folder_id {
            Some(id) => RemoteRoot::Folder(id),
            None => RemoteRoot::EntireDrive,
        }
    }

    /// Stable identifier used for cache keys and reports.
    pub fn identifier(&self) -> &str {
        match self {
            RemoteRoot::EntireDrive => ENTIRE_DRIVE,
            RemoteRoot::Folder(id) => id,
        }
    }

    fn folder_id(&self) -> Option<String> {
        match self {
            RemoteRoot::EntireDrive => None,
            RemoteRoot::Folder(id) => Some(id.clone()),
        }
    }
}

/// One folder waiting to be listed: its id (`None` = drive root) and the
/// relative path prefix of its contents.
type PendingFolder = (Option<String>, String);

struct FolderListing {
    files: Vec<FileRecord>,
    subfolders: Vec<PendingFolder>,
}

pub struct RemoteScanner {
    client: Arc<dyn DriveClient>,
    page_size: usize,
    max_retries: u32,
    retry_base_delay_ms: u64,
    max_in_flight: usize,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl RemoteScanner {
    pub fn new(client: Arc<dyn DriveClient>) -> Self {
        Self {
            client,
            page_size: MAX_PAGE_SIZE,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            max_in_flight: 4,
            cancel_flag: None,
        }
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn retry_base_delay_ms(mut self, delay: u64) -> Self {
        self.retry_base_delay_ms = delay;
        self
    }

    pub fn max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = limit.max(1);
        self
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .map(|f| f.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    /// Lists every file transitively nested under `root`. Only leaf files
    /// contribute records; folders just extend the traversal.
    pub async fn scan(&self, root: &RemoteRoot) -> Result<Snapshot> {
        info!(root = root.identifier(), "scanning remote tree");

        let mut snapshot = Snapshot::new(Source::Remote, root.identifier());
        let mut pending: VecDeque<PendingFolder> =
            VecDeque::from([(root.folder_id(), String::new())]);
        let mut in_flight = FuturesUnordered::new();
        let mut folders_listed = 0usize;

        loop {
            while in_flight.len() < self.max_in_flight {
                let Some((folder, prefix)) = pending.pop_front() else {
                    break;
                };
                if self.is_cancelled() {
                    return Err(CheckError::Cancelled);
                }
                in_flight.push(self.list_folder(folder, prefix));
            }

            let Some(outcome) = in_flight.next().await else {
                break;
            };
            let listing = outcome.map_err(|e| match e {
                e @ (CheckError::Auth(_) | CheckError::Cancelled | CheckError::Scan { .. }) => e,
                other => CheckError::scan(Source::Remote, other.to_string()),
            })?;

            folders_listed += 1;
            for record in listing.files {
                snapshot.insert(record);
            }
            pending.extend(listing.subfolders);
        }

        info!(
            files = snapshot.len(),
            folders = folders_listed,
            "remote scan complete"
        );
        Ok(snapshot)
    }

    /// Drains every page of one folder, following continuation tokens until
    /// exhausted. Files come back with their full relative path; discovered
    /// sub-folders carry the extended prefix for the worklist.
    async fn list_folder(
        &self,
        folder: Option<String>,
        prefix: String,
    ) -> Result<FolderListing> {
        let mut files = Vec::new();
        let mut subfolders = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            if self.is_cancelled() {
                return Err(CheckError::Cancelled);
            }

            let page = self
                .list_page_with_retry(folder.as_deref(), page_token.as_deref())
                .await?;

            for item in page.items {
                let path = if prefix.is_empty() {
                    item.name
                } else {
                    format!("{}/{}", prefix, item.name)
                };
                if item.is_folder {
                    subfolders.push((Some(item.id), path));
                } else {
                    files.push(FileRecord {
                        relative_path: path,
                        size_bytes: item.size_bytes,
                    });
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            folder = folder.as_deref().unwrap_or("root"),
            files = files.len(),
            subfolders = subfolders.len(),
            "folder listed"
        );
        Ok(FolderListing { files, subfolders })
    }

    /// One listing call with exponential backoff on transient failures.
    /// Retrying re-issues only the failed call; pages already consumed are
    /// never fetched again. Exhausting the attempts fails the whole scan.
    async fn list_page_with_retry(
        &self,
        parent: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<ListPage> {
        let mut last_error = String::new();

        for attempt in 0..=self.max_retries {
            if self.is_cancelled() {
                return Err(CheckError::Cancelled);
            }

            match self
                .client
                .list_page(parent, page_token, self.page_size)
                .await
            {
                Ok(page) => {
                    if attempt > 0 {
                        info!(attempt, "listing succeeded after retry");
                    }
                    return Ok(page);
                }
                Err(CheckError::Transient(message)) => {
                    last_error = message;
                    if attempt < self.max_retries {
                        let delay = self.retry_base_delay_ms * 2u64.pow(attempt);
                        warn!(
                            attempt,
                            delay_ms = delay,
                            error = %last_error,
                            "transient listing failure, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }

        Err(CheckError::scan(
            Source::Remote,
            format!(
                "listing retries exhausted after {} attempts: {last_error}",
                self.max_retries + 1
            ),
        ))
    }
}
