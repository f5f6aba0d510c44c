//! Listing and download against the Firebase Storage REST surface.
//!
//! Uses raw reqwest against the bucket's public object API — no vendor SDK
//! needed. Objects live under a configurable prefix (the original layout is
//! a `pdfs/` folder); each object resolves to a media URL.

use std::io::Write;
use std::time::Duration;

use serde::Deserialize;
use tempfile::NamedTempFile;

use scanmatch_core::DocumentHandle;

use crate::StorageError;

pub(crate) const API_BASE: &str = "https://firebasestorage.googleapis.com/v0/b";

const DEFAULT_PREFIX: &str = "pdfs/";
const DEFAULT_LIST_RETRIES: u32 = 2;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// One page of an object listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListPage {
    #[serde(default)]
    pub items: Vec<ListItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListItem {
    pub name: String,
}

/// Client for one storage bucket.
pub struct FirebaseClient {
    client: reqwest::Client,
    bucket: String,
    prefix: String,
    list_retries: u32,
    timeout: Duration,
}

impl FirebaseClient {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            bucket: bucket.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            list_retries: DEFAULT_LIST_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Object-key prefix to list under. Pass `""` to list the whole bucket.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// How many times a failed listing is retried before giving up.
    pub fn with_list_retries(mut self, retries: u32) -> Self {
        self.list_retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// List the documents under the configured prefix, sorted by name.
    ///
    /// The whole listing is retried with linear backoff on failure. Sorting
    /// stabilizes the otherwise pagination-dependent order so the selection
    /// list is deterministic across runs.
    pub async fn list(&self) -> Result<Vec<DocumentHandle>, StorageError> {
        let mut last_error = None;
        for attempt in 0..=self.list_retries {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            match self.list_once().await {
                Ok(handles) => {
                    tracing::debug!(count = handles.len(), "listed documents");
                    return Ok(handles);
                }
                Err(error) => {
                    tracing::warn!(%error, attempt, "document listing failed");
                    last_error = Some(error);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| StorageError::ListingFailed("no listing attempts made".into())))
    }

    async fn list_once(&self) -> Result<Vec<DocumentHandle>, StorageError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/{}/o?prefix={}",
                API_BASE,
                self.bucket,
                urlencoding::encode(&self.prefix)
            );
            if let Some(ref token) = page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
            }

            let resp = self
                .client
                .get(&url)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| StorageError::ListingFailed(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(StorageError::ListingFailed(format!(
                    "list failed: HTTP {}",
                    resp.status()
                )));
            }

            let page: ListPage = resp
                .json()
                .await
                .map_err(|e| StorageError::ListingFailed(e.to_string()))?;

            items.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(collate(&self.bucket, &self.prefix, items))
    }

    /// Download a document to a temp file.
    pub async fn download(&self, handle: &DocumentHandle) -> Result<NamedTempFile, StorageError> {
        let resp = self
            .client
            .get(&handle.url)
            .timeout(self.timeout)
            .send()
            .await?;

        // A 404 means the listed object no longer resolves (deleted or
        // renamed between listing and download); other failures are plain
        // download errors.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::ItemResolutionFailed {
                name: handle.name.clone(),
                message: "object not found".to_string(),
            });
        }
        if !resp.status().is_success() {
            return Err(StorageError::DownloadFailed(format!(
                "{}: HTTP {}",
                handle.name,
                resp.status()
            )));
        }

        let bytes = resp.bytes().await?;
        let mut file = NamedTempFile::new()?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(file)
    }
}

/// Media URL for an object key.
pub(crate) fn object_url(bucket: &str, name: &str) -> String {
    format!(
        "{}/{}/o/{}?alt=media",
        API_BASE,
        bucket,
        urlencoding::encode(name)
    )
}

/// Convert raw listing items into handles: drop folder placeholders, strip
/// the prefix from display names, sort by name.
pub(crate) fn collate(bucket: &str, prefix: &str, items: Vec<ListItem>) -> Vec<DocumentHandle> {
    let mut handles: Vec<DocumentHandle> = items
        .into_iter()
        .filter(|item| item.name != prefix && !item.name.ends_with('/'))
        .map(|item| {
            let display = item
                .name
                .strip_prefix(prefix)
                .unwrap_or(&item.name)
                .to_string();
            DocumentHandle {
                name: display,
                url: object_url(bucket, &item.name),
            }
        })
        .collect();
    handles.sort_by(|a, b| a.name.cmp(&b.name));
    handles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_page_parses_items_and_token() {
        let body = r#"{
            "items": [
                {"name": "pdfs/invoice.pdf", "bucket": "swiftscan.appspot.com"},
                {"name": "pdfs/manual.pdf", "bucket": "swiftscan.appspot.com"}
            ],
            "nextPageToken": "abc123"
        }"#;
        let page: ListPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "pdfs/invoice.pdf");
        assert_eq!(page.next_page_token.as_deref(), Some("abc123"));
    }

    #[test]
    fn list_page_without_items_parses_empty() {
        // Scenario E: an empty folder lists zero documents.
        let page: ListPage = serde_json::from_str(r#"{"prefixes": ["pdfs/"]}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn object_url_percent_encodes_the_key() {
        let url = object_url("swiftscan.appspot.com", "pdfs/My Invoice.pdf");
        assert_eq!(
            url,
            "https://firebasestorage.googleapis.com/v0/b/swiftscan.appspot.com/o/pdfs%2FMy%20Invoice.pdf?alt=media"
        );
    }

    #[test]
    fn collate_strips_prefix_and_sorts() {
        let items = vec![
            ListItem {
                name: "pdfs/zebra.pdf".into(),
            },
            ListItem {
                name: "pdfs/alpha.pdf".into(),
            },
        ];
        let handles = collate("bucket", "pdfs/", items);
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].name, "alpha.pdf");
        assert_eq!(handles[1].name, "zebra.pdf");
        assert!(handles[0].url.contains("pdfs%2Falpha.pdf"));
    }

    #[test]
    fn collate_drops_folder_placeholders() {
        let items = vec![
            ListItem {
                name: "pdfs/".into(),
            },
            ListItem {
                name: "pdfs/sub/".into(),
            },
            ListItem {
                name: "pdfs/real.pdf".into(),
            },
        ];
        let handles = collate("bucket", "pdfs/", items);
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].name, "real.pdf");
    }
}
