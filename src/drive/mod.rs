//! Remote listing API boundary.
//!
//! The scanner only depends on [`DriveClient`]: one page of children for one
//! folder, plus a continuation token. [`http::GoogleDriveClient`] is the real
//! implementation; tests substitute an in-memory fake.

pub mod http;

pub use http::{AccessToken, GoogleDriveClient};

use crate::error::Result;
use async_trait::async_trait;

/// Largest page the listing API accepts.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Root identifier recorded for entire-drive scans.
pub const ENTIRE_DRIVE: &str = "drive-root";

/// One item returned by a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveItem {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    /// Zero for folders.
    pub size_bytes: u64,
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub items: Vec<DriveItem>,
    /// Opaque cursor for the next page, `None` when exhausted.
    pub next_page_token: Option<String>,
}

/// An authorized handle onto the remote store's listing API.
///
/// Implementations must exclude trashed items and must honor the page-size
/// cap ([`MAX_PAGE_SIZE`]). Rate limiting and transient server errors map to
/// [`CheckError::Transient`](crate::CheckError::Transient) so the scanner can
/// retry them.
#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Lists one page of the children of `parent`. `None` scopes the listing
    /// to the top of the drive.
    async fn list_page(
        &self,
        parent: Option<&str>,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage>;
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::error::CheckError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// In-memory drive: folder id -> children. The drive root is keyed by
    /// `"root"`.
    pub struct FakeDrive {
        folders: HashMap<String, Vec<DriveItem>>,
        /// Fail this many listing calls with a transient error before
        /// succeeding.
        transient_failures: AtomicU32,
        pub calls: AtomicU32,
    }

    impl FakeDrive {
        pub fn new() -> Self {
            Self {
                folders: HashMap::new(),
                transient_failures: AtomicU32::new(0),
                calls: AtomicU32::new(0),
            }
        }

        pub fn folder(mut self, id: &str, children: Vec<DriveItem>) -> Self {
            self.folders.insert(id.to_string(), children);
            self
        }

        pub fn failing_first(self, n: u32) -> Self {
            self.transient_failures.store(n, Ordering::SeqCst);
            self
        }

        pub fn file(id: &str, name: &str, size: u64) -> DriveItem {
            DriveItem {
                id: id.into(),
                name: name.into(),
                is_folder: false,
                size_bytes: size,
            }
        }

        pub fn dir(id: &str, name: &str) -> DriveItem {
            DriveItem {
                id: id.into(),
                name: name.into(),
                is_folder: true,
                size_bytes: 0,
            }
        }
    }

    #[async_trait]
    impl DriveClient for FakeDrive {
        async fn list_page(
            &self,
            parent: Option<&str>,
            page_token: Option<&str>,
            page_size: usize,
        ) -> Result<ListPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let remaining = self.transient_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.transient_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(CheckError::Transient("simulated 429".into()));
            }

            let key = parent.unwrap_or("root");
            let children = self.folders.get(key).cloned().unwrap_or_default();

            let offset: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            let end = (offset + page_size).min(children.len());
            let next_page_token = if end < children.len() {
                Some(end.to_string())
            } else {
                None
            };

            Ok(ListPage {
                items: children[offset..end].to_vec(),
                next_page_token,
            })
        }
    }
}
