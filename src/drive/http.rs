//! Google Drive v3 listing client.

use super::{DriveItem, ListPage, MAX_PAGE_SIZE};
use crate::error::{CheckError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

const FILES_ENDPOINT: &str = "https://www.googleapis.com/drive/v3/files";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
/// Google-native documents (Docs, Sheets, ...) have no byte size and cannot
/// be compared against a local file; the client skips them.
const GOOGLE_APPS_PREFIX: &str = "application/vnd.google-apps.";

/// Opaque bearer token obtained by the external auth flow.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// [`DriveClient`](super::DriveClient) over the `files.list` endpoint.
pub struct GoogleDriveClient {
    http: reqwest::Client,
    token: AccessToken,
    endpoint: String,
}

impl GoogleDriveClient {
    pub fn new(token: AccessToken) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            endpoint: FILES_ENDPOINT.to_string(),
        }
    }

    /// Points the client at a different endpoint (API-compatible mirrors).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// `files.list` response body. Drive serializes `size` as a decimal string.
#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: String,
    name: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
    size: Option<String>,
}

#[async_trait]
impl super::DriveClient for GoogleDriveClient {
    async fn list_page(
        &self,
        parent: Option<&str>,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<ListPage> {
        // "root" is the API's alias for the top of My Drive.
        let parent = parent.unwrap_or("root");
        let query = format!("'{}' in parents and trashed=false", parent.replace('\'', "\\'"));
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE).to_string();

        let mut request = self
            .http
            .get(&self.endpoint)
            .bearer_auth(self.token.as_str())
            .query(&[
                ("q", query.as_str()),
                ("pageSize", page_size.as_str()),
                ("fields", "nextPageToken, files(id, name, mimeType, size)"),
            ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                CheckError::Transient(e.to_string())
            } else {
                CheckError::RemoteApi(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(CheckError::Transient(format!("HTTP {status}")));
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(CheckError::Auth(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CheckError::RemoteApi(format!("HTTP {status}: {body}")));
        }

        let body: FileListResponse = response
            .json()
            .await
            .map_err(|e| CheckError::RemoteApi(format!("invalid listing body: {e}")))?;

        let mut items = Vec::with_capacity(body.files.len());
        let mut skipped_native = 0u32;
        for raw in body.files {
            let is_folder = raw.mime_type == FOLDER_MIME;
            if !is_folder && raw.mime_type.starts_with(GOOGLE_APPS_PREFIX) {
                skipped_native += 1;
                continue;
            }
            let size_bytes = match raw.size.as_deref() {
                Some(s) => s.parse().unwrap_or(0),
                None => 0,
            };
            items.push(DriveItem {
                id: raw.id,
                name: raw.name,
                is_folder,
                size_bytes,
            });
        }

        if skipped_native > 0 {
            debug!(parent, skipped_native, "skipped Google-native documents without a byte size");
        }

        Ok(ListPage {
            items,
            next_page_token: body.next_page_token,
        })
    }
}
