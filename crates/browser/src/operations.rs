//! Delete and download of single entries.

use std::sync::Arc;

use protocol::{DeleteRequest, FileInfo};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::cancel::CancelHandle;
use crate::entry::BrowserEntry;
use crate::error::{BrowserError, BrowserResult};
use crate::listing::DirectoryListingStore;
use crate::notify::{ConfirmDelete, SaveTarget};
use crate::service::FileService;

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The service deleted the entry and it was dropped from the listing.
    Deleted,
    /// The confirmation hook declined; nothing was sent.
    Declined,
}

/// A completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub name: String,
    pub size: u64,
    /// Hex SHA-256 of the saved bytes.
    pub sha256: String,
}

pub struct FileOperations<S: FileService> {
    service: Arc<S>,
    cancel: CancelHandle,
}

impl<S: FileService> FileOperations<S> {
    pub fn new(service: Arc<S>, cancel: CancelHandle) -> Self {
        Self { service, cancel }
    }

    /// Delete `entry` after asking `confirm`.
    ///
    /// On success the entry is removed from `store` locally. On failure the
    /// listing is left untouched and the service's error text is returned.
    pub async fn delete_file(
        &self,
        store: &DirectoryListingStore<S>,
        entry: &BrowserEntry,
        confirm: &dyn ConfirmDelete,
    ) -> BrowserResult<DeleteOutcome> {
        if !confirm.confirm(entry) {
            debug!(path = %entry.path(), "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        let request = DeleteRequest {
            path: entry.path().to_string(),
            current_path: store.current_path().await,
        };
        let response = self.cancel.run(self.service.delete(&request)).await?;

        if !response.success {
            let message = response
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| format!("failed to delete {}", entry.name()));
            warn!(path = %entry.path(), error = %message, "delete rejected");
            return Err(BrowserError::Rejected(message));
        }

        store.remove_entry(entry.path()).await;
        info!(path = %entry.path(), "entry deleted");
        Ok(DeleteOutcome::Deleted)
    }

    /// Look up what lives at `path`.
    pub async fn file_info(&self, path: &str) -> BrowserResult<FileInfo> {
        self.cancel.run(self.service.file_info(path)).await
    }

    /// Download `entry` into `target`. Directories are refused without a
    /// request.
    pub async fn download_file(
        &self,
        entry: &BrowserEntry,
        target: &dyn SaveTarget,
    ) -> BrowserResult<DownloadOutcome> {
        if entry.is_dir() {
            return Err(BrowserError::IsADirectory(entry.path().to_string()));
        }
        self.download_path(entry.path(), target).await
    }

    /// Download the file at `path` into `target`.
    pub async fn download_path(
        &self,
        path: &str,
        target: &dyn SaveTarget,
    ) -> BrowserResult<DownloadOutcome> {
        debug!(path, "downloading");
        let payload = self.cancel.run(self.service.download(path)).await?;

        let name = if payload.file_name.is_empty() {
            path.rsplit('/').next().unwrap_or(path).to_string()
        } else {
            payload.file_name
        };

        target
            .save(&name, &payload.data)
            .map_err(|e| BrowserError::Save {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        let sha256 = hex::encode(Sha256::digest(&payload.data));
        info!(path, name = %name, size = payload.data.len(), "download saved");

        Ok(DownloadOutcome {
            size: payload.data.len() as u64,
            name,
            sha256,
        })
    }
}
