//! Entries as held by the browser: a server snapshot plus derived fields.

use protocol::FileEntry;
use serde::{Deserialize, Serialize};

use crate::classify::{self, Icon, SecurityLevel};

/// Outcome of an upload for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Success,
    Failed,
}

/// A listed entry with classifier-derived annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserEntry {
    /// Server snapshot. Never edited after construction.
    #[serde(flatten)]
    pub remote: FileEntry,
    /// Heuristic risk label.
    pub security_level: SecurityLevel,
    /// Display tag.
    pub icon: Icon,
    /// Set once the scan pass has visited this entry.
    pub scanned: bool,
    /// Present only for entries touched by the last upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_status: Option<UploadStatus>,
}

impl BrowserEntry {
    /// Wrap a server entry and classify it.
    pub fn from_remote(remote: FileEntry) -> Self {
        let security_level = classify::classify(&remote);
        let icon = classify::icon_for(&remote);
        Self {
            remote,
            security_level,
            icon,
            scanned: false,
            upload_status: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.remote.name
    }

    pub fn path(&self) -> &str {
        &self.remote.path
    }

    pub fn is_dir(&self) -> bool {
        self.remote.is_dir
    }

    pub fn size(&self) -> u64 {
        self.remote.size
    }

    pub fn modified(&self) -> u64 {
        self.remote.modified
    }
}

impl From<FileEntry> for BrowserEntry {
    fn from(remote: FileEntry) -> Self {
        Self::from_remote(remote)
    }
}
