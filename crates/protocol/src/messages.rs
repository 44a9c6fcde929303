//! Wire types exchanged with the remote file service.
//!
//! Every request and response body the browser sends or receives is defined
//! here. All bodies are JSON; field names follow the service's snake_case
//! convention.

use serde::{Deserialize, Serialize};

// ============================================================================
// Listing
// ============================================================================

/// A single file or directory entry as reported by the service.
///
/// Entries are immutable snapshots: the browser never edits these fields, it
/// only replaces whole listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Full path on the remote side. Unique within a listing.
    pub path: String,
    /// Whether this entry is a directory.
    pub is_dir: bool,
    /// Size in bytes (0 for directories).
    #[serde(default)]
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds).
    #[serde(default)]
    pub modified: u64,
    /// Free-form type tag reported by the service (e.g. "file", "directory").
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl FileEntry {
    /// Create a regular file entry.
    pub fn file(name: impl Into<String>, path: impl Into<String>, size: u64, modified: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: false,
            size,
            modified,
            kind: "file".to_string(),
        }
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>, path: impl Into<String>, modified: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            is_dir: true,
            size: 0,
            modified,
            kind: "directory".to_string(),
        }
    }
}

/// Response to a listing request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListResponse {
    /// Entries of the listed directory.
    #[serde(default, alias = "files")]
    pub entries: Vec<FileEntry>,
    /// Path that was listed, as resolved by the service.
    pub current_path: String,
    /// Parent of `current_path`. Empty at the root.
    #[serde(default)]
    pub parent_path: String,
}

// ============================================================================
// Upload
// ============================================================================

/// One file inside an upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPart {
    /// File name as it should appear in the destination directory.
    pub name: String,
    /// File contents.
    pub data: Vec<u8>,
}

/// A file the service refused while accepting the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    /// Name of the rejected file.
    pub name: String,
    /// Reason given by the service.
    #[serde(default)]
    pub error: String,
}

/// Response to an upload batch.
///
/// Carries the refreshed listing of the destination directory plus the files
/// the service rejected individually.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Entries of the destination directory after the upload.
    #[serde(default, alias = "files")]
    pub entries: Vec<FileEntry>,
    /// Destination directory.
    pub current_path: String,
    /// Parent of the destination directory.
    #[serde(default)]
    pub parent_path: String,
    /// Files the service refused.
    #[serde(default)]
    pub failed: Vec<UploadFailure>,
}

impl UploadResponse {
    /// Returns true if the service refused `name`.
    pub fn is_failed(&self, name: &str) -> bool {
        self.failed.iter().any(|f| f.name == name)
    }
}

// ============================================================================
// Delete
// ============================================================================

/// Request to delete a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    /// Path of the entry to delete.
    pub path: String,
    /// Directory the browser was showing when the delete was issued.
    pub current_path: String,
}

/// Response to a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Whether the entry was deleted.
    pub success: bool,
    /// Error text when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// Download & info
// ============================================================================

/// Binary payload of a downloaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPayload {
    /// File name to save as.
    pub file_name: String,
    /// File contents.
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

/// Resolution of a path reference.
///
/// Used to decide whether a path should be opened as a folder or downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileInfo {
    /// Whether anything exists at the path.
    pub exists: bool,
    /// Whether the path is a directory.
    #[serde(default)]
    pub is_dir: bool,
    /// Absolute path as resolved by the service.
    #[serde(default)]
    pub abs_path: String,
    /// Final path component.
    #[serde(default)]
    pub file_name: String,
}

/// Error body returned by the service alongside a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    #[serde(alias = "message")]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_type_field_renamed() {
        let entry = FileEntry::file("notes.txt", "/home/notes.txt", 12, 1704067200);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"file\""));
        assert!(!json.contains("kind"));
    }

    #[test]
    fn test_file_entry_missing_optional_fields() {
        let json = r#"{"name":"docs","path":"/docs","is_dir":true}"#;
        let entry: FileEntry = serde_json::from_str(json).unwrap();
        assert!(entry.is_dir);
        assert_eq!(entry.size, 0);
        assert_eq!(entry.modified, 0);
        assert_eq!(entry.kind, "");
    }

    #[test]
    fn test_list_response_accepts_files_alias() {
        let json = r#"{
            "files": [{"name":"a.txt","path":"/a.txt","is_dir":false,"size":3,"modified":1,"type":"file"}],
            "current_path": "/",
            "parent_path": ""
        }"#;
        let response: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.entries.len(), 1);
        assert_eq!(response.entries[0].name, "a.txt");
        assert!(response.parent_path.is_empty());
    }

    #[test]
    fn test_upload_response_failed_lookup() {
        let json = r#"{
            "entries": [],
            "current_path": "/up",
            "parent_path": "/",
            "failed": [{"name": "bad.exe", "error": "blocked"}]
        }"#;
        let response: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_failed("bad.exe"));
        assert!(!response.is_failed("ok.txt"));
        assert_eq!(response.failed[0].error, "blocked");
    }

    #[test]
    fn test_upload_response_without_failed_list() {
        let json = r#"{"entries": [], "current_path": "/up"}"#;
        let response: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(response.failed.is_empty());
    }

    #[test]
    fn test_delete_request_shape() {
        let request = DeleteRequest {
            path: "/data/old.log".to_string(),
            current_path: "/data".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["path"], "/data/old.log");
        assert_eq!(value["current_path"], "/data");
    }

    #[test]
    fn test_delete_response_error_optional() {
        let ok: DeleteResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed: DeleteResponse =
            serde_json::from_str(r#"{"success": false, "error": "permission denied"}"#).unwrap();
        assert_eq!(failed.error.as_deref(), Some("permission denied"));
    }

    #[test]
    fn test_error_body_message_alias() {
        let body: ErrorBody = serde_json::from_str(r#"{"message": "no such path"}"#).unwrap();
        assert_eq!(body.error, "no such path");
    }

    #[test]
    fn test_unicode_paths() {
        let entry = FileEntry::file("résumé.pdf", "/文档/résumé.pdf", 10, 0);
        let json = serde_json::to_string(&entry).unwrap();
        let decoded: FileEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, entry);
    }
}
