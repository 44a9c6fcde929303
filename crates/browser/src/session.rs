//! The browser session: one instance of the remote file browser.
//!
//! [`BrowserSession`] ties the listing store, upload pipeline and file
//! operations to a single [`FileService`] and reports every outcome through
//! its [`Notifier`]. Sessions are explicit values; nothing is global.

use std::sync::Arc;

use protocol::FileInfo;
use tokio::sync::{watch, RwLock};
use tracing::info;

use crate::cancel::CancelHandle;
use crate::config::Config;
use crate::entry::BrowserEntry;
use crate::error::{BrowserError, BrowserResult};
use crate::listing::{DirectoryListing, DirectoryListingStore};
use crate::notify::{ConfirmDelete, Notifier, ProgressSink, SaveTarget, Severity};
use crate::operations::{DeleteOutcome, DownloadOutcome, FileOperations};
use crate::service::FileService;
use crate::sort::{sort_entries, SortKey, SortSpec};
use crate::upload::{UploadBatch, UploadCandidate, UploadPipeline, UploadReport};

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSnapshot {
    pub listing: DirectoryListing,
    pub loading: bool,
    pub upload: Option<UploadBatch>,
    pub sort: SortSpec,
    pub history_depth: usize,
}

impl BrowserSnapshot {
    /// Listing entries in display order.
    pub fn sorted_entries(&self) -> Vec<BrowserEntry> {
        sort_entries(&self.listing.entries, &self.sort)
    }
}

/// What [`BrowserSession::open_path`] did with a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Navigated,
    Downloaded(DownloadOutcome),
}

pub struct BrowserSession<S: FileService> {
    store: DirectoryListingStore<S>,
    uploads: UploadPipeline<S>,
    operations: FileOperations<S>,
    sort: RwLock<SortSpec>,
    notifier: Arc<dyn Notifier>,
    cancel: CancelHandle,
}

impl<S: FileService> BrowserSession<S> {
    pub fn new(service: S, config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_shared_service(Arc::new(service), config, notifier)
    }

    /// Create a session over a service shared with other owners.
    pub fn with_shared_service(
        service: Arc<S>,
        config: &Config,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let cancel = CancelHandle::new();
        Self {
            store: DirectoryListingStore::new(service.clone(), &config.browser, cancel.clone()),
            uploads: UploadPipeline::new(service.clone(), config.upload.max_size, cancel.clone()),
            operations: FileOperations::new(service, cancel.clone()),
            sort: RwLock::new(SortSpec::default()),
            notifier,
            cancel,
        }
    }

    /// (Re)open the browser: clears history and lists the root.
    pub async fn open(&self) -> BrowserResult<()> {
        let result = self.store.open().await;
        self.report_fetch(&result);
        result
    }

    /// List `path`; an empty path lists the configured root.
    pub async fn fetch_files(&self, path: &str) -> BrowserResult<()> {
        let result = self.store.fetch_files(path).await;
        self.report_fetch(&result);
        result
    }

    pub async fn refresh(&self) -> BrowserResult<()> {
        let result = self.store.refresh().await;
        self.report_fetch(&result);
        result
    }

    pub async fn navigate_to_folder(&self, path: &str) -> BrowserResult<()> {
        let result = self.store.navigate_to_folder(path).await;
        self.report_fetch(&result);
        result
    }

    /// Returns false when already at the top.
    pub async fn navigate_up(&self) -> BrowserResult<bool> {
        let result = self.store.navigate_up().await;
        self.report_fetch(&result);
        result
    }

    /// Returns false when there is nowhere to go back to.
    pub async fn navigate_back(&self) -> BrowserResult<bool> {
        let result = self.store.navigate_back().await;
        self.report_fetch(&result);
        result
    }

    /// Resolve `path` on the service and act on it: directories are
    /// navigated into, files are downloaded into `target`.
    pub async fn open_path(
        &self,
        path: &str,
        target: &dyn SaveTarget,
    ) -> BrowserResult<OpenOutcome> {
        let result = self.resolve_and_open(path, target).await;
        if let Err(err) = &result {
            self.notify(&format!("Cannot open {}: {}", path, err), Severity::Error);
        }
        result
    }

    async fn resolve_and_open(
        &self,
        path: &str,
        target: &dyn SaveTarget,
    ) -> BrowserResult<OpenOutcome> {
        let info = self.operations.file_info(path).await?;
        if !info.exists {
            return Err(BrowserError::NotFound(path.to_string()));
        }

        let resolved = if info.abs_path.is_empty() {
            path.to_string()
        } else {
            info.abs_path
        };

        if info.is_dir {
            self.store.navigate_to_folder(&resolved).await?;
            Ok(OpenOutcome::Navigated)
        } else {
            let outcome = self.operations.download_path(&resolved, target).await?;
            self.notify(&format!("Downloaded {}", outcome.name), Severity::Success);
            Ok(OpenOutcome::Downloaded(outcome))
        }
    }

    /// Look up what lives at `path` without touching the listing.
    pub async fn file_info(&self, path: &str) -> BrowserResult<FileInfo> {
        self.operations.file_info(path).await
    }

    /// Upload files into the directory currently shown.
    pub async fn upload(
        &self,
        candidates: Vec<UploadCandidate>,
        sink: &dyn ProgressSink,
    ) -> BrowserResult<UploadReport> {
        let offered = candidates.len();
        let result = self.uploads.upload(&self.store, candidates, sink).await;

        match &result {
            Ok(report) => {
                for rejection in &report.rejected {
                    self.notify(
                        &format!("{}: {}", rejection.name, rejection.reason),
                        Severity::Warning,
                    );
                }
                if !report.failed.is_empty() {
                    let details: Vec<String> = report
                        .failed
                        .iter()
                        .map(|f| format!("{} ({})", f.name, f.error))
                        .collect();
                    self.notify(
                        &format!(
                            "Uploaded {} of {} files; failed: {}",
                            report.uploaded.len(),
                            offered,
                            details.join(", ")
                        ),
                        Severity::Warning,
                    );
                } else if !report.uploaded.is_empty() {
                    self.notify(
                        &format!("Uploaded {} file(s)", report.uploaded.len()),
                        Severity::Success,
                    );
                }
            }
            Err(err) => self.notify(&err.to_string(), Severity::Error),
        }
        result
    }

    /// Delete the listed entry at `path`.
    pub async fn delete(
        &self,
        path: &str,
        confirm: &dyn ConfirmDelete,
    ) -> BrowserResult<DeleteOutcome> {
        let result = match self.store.find(path).await {
            Some(entry) => self.operations.delete_file(&self.store, &entry, confirm).await,
            None => Err(BrowserError::NotFound(path.to_string())),
        };

        match &result {
            Ok(DeleteOutcome::Deleted) => self.notify(&format!("Deleted {}", path), Severity::Success),
            Ok(DeleteOutcome::Declined) => {}
            Err(err) => self.notify(&format!("Delete failed: {}", err), Severity::Error),
        }
        result
    }

    /// Download the listed entry at `path` into `target`.
    pub async fn download(
        &self,
        path: &str,
        target: &dyn SaveTarget,
    ) -> BrowserResult<DownloadOutcome> {
        let result = match self.store.find(path).await {
            Some(entry) => self.operations.download_file(&entry, target).await,
            None => Err(BrowserError::NotFound(path.to_string())),
        };

        match &result {
            Ok(outcome) => self.notify(&format!("Downloaded {}", outcome.name), Severity::Success),
            Err(err) => self.notify(&format!("Download failed: {}", err), Severity::Error),
        }
        result
    }

    /// Select a sort key: the active key flips direction, a new key sorts
    /// ascending.
    pub async fn select_sort(&self, key: SortKey) -> SortSpec {
        let mut sort = self.sort.write().await;
        sort.select(key);
        *sort
    }

    pub async fn set_sort(&self, spec: SortSpec) {
        *self.sort.write().await = spec;
    }

    pub async fn sort_spec(&self) -> SortSpec {
        *self.sort.read().await
    }

    /// Entries of the current listing in display order.
    pub async fn sorted_entries(&self) -> Vec<BrowserEntry> {
        let spec = self.sort_spec().await;
        let listing = self.store.snapshot().await;
        sort_entries(&listing.entries, &spec)
    }

    pub async fn snapshot(&self) -> BrowserSnapshot {
        BrowserSnapshot {
            listing: self.store.snapshot().await,
            loading: self.store.is_loading(),
            upload: self.uploads.current_batch(),
            sort: self.sort_spec().await,
            history_depth: self.store.history_depth().await,
        }
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.store.subscribe_loading()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<Option<UploadBatch>> {
        self.uploads.subscribe()
    }

    /// Abort every in-flight service call of this session.
    pub fn cancel(&self) {
        info!("cancelling in-flight operations");
        self.cancel.cancel();
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.notifier.notify(message, severity);
    }

    fn report_fetch<T>(&self, result: &BrowserResult<T>) {
        match result {
            Ok(_) | Err(BrowserError::Cancelled) => {}
            Err(BrowserError::Busy) => self.notify(&BrowserError::Busy.to_string(), Severity::Warning),
            Err(err) => self.notify(&format!("Failed to load directory: {}", err), Severity::Error),
        }
    }
}
