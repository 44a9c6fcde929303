//! Directory listing state and navigation.
//!
//! [`DirectoryListingStore`] owns the listing of the current remote working
//! directory together with the navigation history. Every successful fetch
//! replaces the listing wholesale; the only in-place edits are the scan
//! marker, upload status annotations and single-entry removal after a delete.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use protocol::{FileEntry, UploadResponse};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cancel::CancelHandle;
use crate::config::BrowserConfig;
use crate::entry::{BrowserEntry, UploadStatus};
use crate::error::{BrowserError, BrowserResult};
use crate::history::NavigationHistory;
use crate::service::FileService;

/// The listing of one remote directory, exactly as last returned by the
/// service plus derived annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub current_path: String,
    /// Empty at the root.
    pub parent_path: String,
    pub entries: Vec<BrowserEntry>,
    generation: u64,
}

impl DirectoryListing {
    /// Bumped every time the entries are replaced or cleared.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by path.
    pub fn find(&self, path: &str) -> Option<&BrowserEntry> {
        self.entries.iter().find(|e| e.path() == path)
    }

    /// Find an entry by name.
    pub fn find_by_name(&self, name: &str) -> Option<&BrowserEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    fn replace(
        &mut self,
        current_path: String,
        parent_path: String,
        entries: Vec<FileEntry>,
        include_hidden: bool,
    ) {
        self.current_path = current_path;
        self.parent_path = parent_path;
        self.entries = entries
            .into_iter()
            .filter(|e| include_hidden || !e.name.starts_with('.'))
            .map(BrowserEntry::from_remote)
            .collect();
        self.generation += 1;
    }

    fn clear_entries(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    fn remove(&mut self, path: &str) -> Option<BrowserEntry> {
        let index = self.entries.iter().position(|e| e.path() == path)?;
        Some(self.entries.remove(index))
    }
}

/// Holds the loading flag for the duration of one fetch.
struct LoadingGuard<'a> {
    flag: &'a watch::Sender<bool>,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a watch::Sender<bool>) -> BrowserResult<Self> {
        let acquired = flag.send_if_modified(|loading| {
            if *loading {
                false
            } else {
                *loading = true;
                true
            }
        });
        if acquired {
            Ok(Self { flag })
        } else {
            Err(BrowserError::Busy)
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.send_replace(false);
    }
}

/// Listing state plus navigation for one browser session.
pub struct DirectoryListingStore<S: FileService> {
    service: Arc<S>,
    listing: RwLock<DirectoryListing>,
    history: Mutex<NavigationHistory>,
    loading: watch::Sender<bool>,
    cancel: CancelHandle,
    root_path: String,
    scan_delay: Duration,
    include_hidden: bool,
}

impl<S: FileService> DirectoryListingStore<S> {
    pub fn new(service: Arc<S>, config: &BrowserConfig, cancel: CancelHandle) -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            service,
            listing: RwLock::new(DirectoryListing::default()),
            history: Mutex::new(NavigationHistory::new()),
            loading,
            cancel,
            root_path: config.root_path.clone(),
            scan_delay: Duration::from_millis(config.scan_delay_ms),
            include_hidden: config.include_hidden,
        }
    }

    /// Fetch `path` and replace the listing with the result.
    ///
    /// An empty `path` lists the configured root. On a network failure or a
    /// rejection the entries are cleared while the paths keep their last good
    /// values. A cancelled fetch leaves the listing alone.
    pub async fn fetch_files(&self, path: &str) -> BrowserResult<()> {
        let target = if path.is_empty() {
            self.root_path.clone()
        } else {
            path.to_string()
        };

        let generation = {
            let _loading = LoadingGuard::acquire(&self.loading)?;
            debug!(path = %target, "fetching directory");

            match self.cancel.run(self.service.list(&target)).await {
                Ok(response) => {
                    let current_path = if response.current_path.is_empty() {
                        target
                    } else {
                        response.current_path
                    };
                    let mut listing = self.listing.write().await;
                    listing.replace(
                        current_path,
                        response.parent_path,
                        response.entries,
                        self.include_hidden,
                    );
                    info!(
                        path = %listing.current_path,
                        entries = listing.len(),
                        "directory loaded"
                    );
                    listing.generation()
                }
                Err(BrowserError::Cancelled) => {
                    debug!(path = %target, "directory fetch cancelled");
                    return Err(BrowserError::Cancelled);
                }
                Err(err) => {
                    warn!(path = %target, error = %err, "directory fetch failed");
                    self.listing.write().await.clear_entries();
                    return Err(err);
                }
            }
        };

        self.scan(generation).await;
        Ok(())
    }

    /// Re-fetch the current directory.
    pub async fn refresh(&self) -> BrowserResult<()> {
        let current = self.current_path().await;
        self.fetch_files(&current).await
    }

    /// Reset history and list the root.
    pub async fn open(&self) -> BrowserResult<()> {
        self.history.lock().await.reset();
        self.fetch_files("").await
    }

    /// Enter `path`, remembering the directory being left.
    pub async fn navigate_to_folder(&self, path: &str) -> BrowserResult<()> {
        let leaving = self.current_path().await;
        self.fetch_files(path).await?;

        let destination = self.current_path().await;
        if !leaving.is_empty() {
            self.history.lock().await.push(&leaving, &destination);
        }
        Ok(())
    }

    /// Go to the parent directory. Returns false when already at the top.
    pub async fn navigate_up(&self) -> BrowserResult<bool> {
        let (leaving, parent) = {
            let listing = self.listing.read().await;
            (listing.current_path.clone(), listing.parent_path.clone())
        };
        if parent.is_empty() {
            debug!(path = %leaving, "already at top, not navigating up");
            return Ok(false);
        }

        self.fetch_files(&parent).await?;
        let destination = self.current_path().await;
        self.history.lock().await.push(&leaving, &destination);
        Ok(true)
    }

    /// Return to the most recently left directory. Returns false when the
    /// history is empty. The history entry is consumed only if the fetch
    /// succeeds.
    pub async fn navigate_back(&self) -> BrowserResult<bool> {
        let previous = match self.history.lock().await.peek() {
            Some(path) => path.to_string(),
            None => return Ok(false),
        };

        self.fetch_files(&previous).await?;
        self.history.lock().await.pop();
        Ok(true)
    }

    /// Drop one entry from the listing without re-fetching.
    pub async fn remove_entry(&self, path: &str) -> Option<BrowserEntry> {
        let removed = self.listing.write().await.remove(path);
        if removed.is_some() {
            debug!(path, "entry removed from listing");
        }
        removed
    }

    /// Merge the listing returned by an upload into `destination`.
    ///
    /// Applied only if the browser still shows `destination`; paths are
    /// compared without trailing slashes. Every returned entry is annotated
    /// `Failed` if the service named it in `failed`, else `Success`.
    /// Returns whether the merge happened.
    pub async fn merge_upload(&self, destination: &str, response: UploadResponse) -> bool {
        let failed: HashSet<&str> = response.failed.iter().map(|f| f.name.as_str()).collect();
        let merged_path = if response.current_path.is_empty() {
            destination.to_string()
        } else {
            response.current_path.clone()
        };

        let generation = {
            let mut listing = self.listing.write().await;
            if !same_directory(&listing.current_path, &merged_path) {
                debug!(
                    showing = %listing.current_path,
                    destination = %merged_path,
                    "upload destination no longer shown, skipping merge"
                );
                return false;
            }

            let current_path = listing.current_path.clone();
            listing.replace(
                current_path,
                response.parent_path.clone(),
                response.entries.clone(),
                self.include_hidden,
            );
            for entry in listing.entries.iter_mut() {
                entry.upload_status = Some(if failed.contains(entry.name()) {
                    UploadStatus::Failed
                } else {
                    UploadStatus::Success
                });
            }
            listing.generation()
        };

        self.scan(generation).await;
        true
    }

    /// Mark every entry of the listing at `generation` as scanned.
    ///
    /// Stops as soon as the listing is replaced.
    async fn scan(&self, generation: u64) {
        if self.scan_delay.is_zero() {
            let mut listing = self.listing.write().await;
            if listing.generation() == generation {
                for entry in listing.entries.iter_mut() {
                    entry.scanned = true;
                }
            }
            return;
        }

        let pending: Vec<String> = {
            let listing = self.listing.read().await;
            if listing.generation() != generation {
                return;
            }
            listing.entries.iter().map(|e| e.path().to_string()).collect()
        };

        for path in pending {
            tokio::time::sleep(self.scan_delay).await;
            let mut listing = self.listing.write().await;
            if listing.generation() != generation {
                debug!(generation, "scan superseded by a newer listing");
                return;
            }
            if let Some(entry) = listing.entries.iter_mut().find(|e| e.path() == path) {
                entry.scanned = true;
            }
        }
    }

    /// Copy of the current listing.
    pub async fn snapshot(&self) -> DirectoryListing {
        self.listing.read().await.clone()
    }

    pub async fn current_path(&self) -> String {
        self.listing.read().await.current_path.clone()
    }

    pub async fn find(&self, path: &str) -> Option<BrowserEntry> {
        self.listing.read().await.find(path).cloned()
    }

    pub async fn history_depth(&self) -> usize {
        self.history.lock().await.depth()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }
}

/// Directory paths equal up to trailing slashes.
fn same_directory(a: &str, b: &str) -> bool {
    fn trimmed(path: &str) -> &str {
        match path.trim_end_matches('/') {
            "" if path.starts_with('/') => "/",
            rest => rest,
        }
    }
    trimmed(a) == trimmed(b)
}
