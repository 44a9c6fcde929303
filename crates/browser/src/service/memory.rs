//! In-process file service over an in-memory tree.
//!
//! Behaves like a remote service (listing, batch upload with per-file
//! refusals, delete, download, info) without any transport. Failure
//! injection and call counters make it the backing service for tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use protocol::{
    DeleteRequest, DeleteResponse, DownloadPayload, FileEntry, FileInfo, ListResponse,
    ProtocolError, Result, UploadFailure, UploadPart, UploadResponse,
};

use super::FileService;
use crate::classify;

/// A failure to inject into the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureMode {
    /// The request never reaches the service.
    Network,
    /// The service answers with a non-success status and this message.
    Rejected(String),
}

impl FailureMode {
    fn into_error(self) -> ProtocolError {
        match self {
            FailureMode::Network => ProtocolError::Network("connection refused".to_string()),
            FailureMode::Rejected(message) => ProtocolError::rejected(Some(500), message),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    is_dir: bool,
    data: Vec<u8>,
    modified: u64,
}

/// Per-operation call counters.
#[derive(Debug, Default)]
struct CallCounts {
    list: AtomicUsize,
    upload: AtomicUsize,
    delete: AtomicUsize,
    download: AtomicUsize,
    info: AtomicUsize,
}

/// In-memory file service.
pub struct MemoryFileService {
    /// Nodes keyed by normalized absolute path. `/` always exists.
    nodes: Mutex<BTreeMap<String, Node>>,
    /// Extensions the service refuses on upload.
    blocked_extensions: HashSet<String>,
    /// Store refused uploads anyway so they show up in the returned listing.
    keep_refused: bool,
    /// Failure returned by the next call, whichever operation it is.
    next_failure: Mutex<Option<FailureMode>>,
    /// Artificial delay before every call completes.
    latency: Duration,
    /// Logical clock for `modified` timestamps.
    clock: AtomicUsize,
    calls: CallCounts,
}

impl MemoryFileService {
    /// Create a service holding only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            Node {
                is_dir: true,
                data: Vec::new(),
                modified: 0,
            },
        );
        Self {
            nodes: Mutex::new(nodes),
            blocked_extensions: HashSet::new(),
            keep_refused: false,
            next_failure: Mutex::new(None),
            latency: Duration::ZERO,
            clock: AtomicUsize::new(1_700_000_000),
            calls: CallCounts::default(),
        }
    }

    /// Refuse uploads of files with these extensions.
    pub fn with_blocked_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_extensions = extensions
            .into_iter()
            .map(|e| e.into().to_ascii_lowercase())
            .collect();
        self
    }

    /// Keep files refused on upload and list them alongside the accepted
    /// ones, like a service that quarantines instead of discarding.
    pub fn with_refused_files_kept(mut self) -> Self {
        self.keep_refused = true;
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Create a directory (and any missing parents).
    pub fn add_dir(&self, path: &str) {
        let path = normalize(path);
        let modified = self.tick();
        let mut nodes = self.lock_nodes();
        for ancestor in ancestors(&path) {
            nodes.entry(ancestor).or_insert(Node {
                is_dir: true,
                data: Vec::new(),
                modified,
            });
        }
    }

    /// Create or replace a file (and any missing parent directories).
    pub fn add_file(&self, path: &str, data: impl Into<Vec<u8>>) {
        let path = normalize(path);
        if let Some(parent) = parent_of(&path) {
            self.add_dir(&parent);
        }
        let modified = self.tick();
        self.lock_nodes().insert(
            path,
            Node {
                is_dir: false,
                data: data.into(),
                modified,
            },
        );
    }

    /// Returns true if anything exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.lock_nodes().contains_key(&normalize(path))
    }

    /// Make the next call fail with `mode`.
    pub fn fail_next(&self, mode: FailureMode) {
        *self
            .next_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(mode);
    }

    pub fn list_calls(&self) -> usize {
        self.calls.list.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.calls.upload.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.calls.delete.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.calls.download.load(Ordering::SeqCst)
    }

    pub fn info_calls(&self) -> usize {
        self.calls.info.load(Ordering::SeqCst)
    }

    fn lock_nodes(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Node>> {
        self.nodes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) as u64
    }

    /// Count the call, wait out the latency and consume any injected failure.
    async fn begin(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let failure = self
            .next_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match failure {
            Some(mode) => Err(mode.into_error()),
            None => Ok(()),
        }
    }

    fn listing(&self, path: &str) -> Result<ListResponse> {
        let path = normalize(path);
        let nodes = self.lock_nodes();
        match nodes.get(&path) {
            Some(node) if node.is_dir => {}
            Some(_) => {
                return Err(ProtocolError::rejected(
                    Some(400),
                    format!("not a directory: {}", path),
                ))
            }
            None => {
                return Err(ProtocolError::rejected(
                    Some(404),
                    format!("path not found: {}", path),
                ))
            }
        }

        let entries = nodes
            .iter()
            .filter(|(child, _)| parent_of(child).as_deref() == Some(path.as_str()))
            .map(|(child, node)| {
                let name = file_name(child);
                if node.is_dir {
                    FileEntry::directory(name, child.clone(), node.modified)
                } else {
                    FileEntry::file(name, child.clone(), node.data.len() as u64, node.modified)
                }
            })
            .collect();

        Ok(ListResponse {
            entries,
            parent_path: parent_of(&path).unwrap_or_default(),
            current_path: path,
        })
    }

    fn is_blocked(&self, name: &str) -> bool {
        classify::extension(name).is_some_and(|ext| self.blocked_extensions.contains(&ext))
    }
}

impl Default for MemoryFileService {
    fn default() -> Self {
        Self::new()
    }
}

impl FileService for MemoryFileService {
    async fn list(&self, path: &str) -> Result<ListResponse> {
        self.begin(&self.calls.list).await?;
        self.listing(path)
    }

    async fn upload(&self, path: &str, parts: Vec<UploadPart>) -> Result<UploadResponse> {
        self.begin(&self.calls.upload).await?;
        let dir = normalize(path);
        // Existence check for the destination.
        self.listing(&dir)?;

        let mut failed = Vec::new();
        for part in parts {
            if part.name.is_empty() || part.name.contains('/') {
                failed.push(UploadFailure {
                    name: part.name,
                    error: "invalid file name".to_string(),
                });
                continue;
            }
            if self.is_blocked(&part.name) {
                failed.push(UploadFailure {
                    name: part.name.clone(),
                    error: "blocked".to_string(),
                });
                if !self.keep_refused {
                    continue;
                }
            }
            let target = join(&dir, &part.name);
            let modified = self.tick();
            self.lock_nodes().insert(
                target,
                Node {
                    is_dir: false,
                    data: part.data,
                    modified,
                },
            );
        }

        let listing = self.listing(&dir)?;
        Ok(UploadResponse {
            entries: listing.entries,
            current_path: listing.current_path,
            parent_path: listing.parent_path,
            failed,
        })
    }

    async fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse> {
        self.begin(&self.calls.delete).await?;
        let path = normalize(&request.path);
        if path == "/" {
            return Ok(DeleteResponse {
                success: false,
                error: Some("cannot delete the root directory".to_string()),
            });
        }

        let mut nodes = self.lock_nodes();
        if nodes.remove(&path).is_none() {
            return Ok(DeleteResponse {
                success: false,
                error: Some(format!("path not found: {}", path)),
            });
        }
        let prefix = format!("{}/", path);
        nodes.retain(|p, _| !p.starts_with(&prefix));

        Ok(DeleteResponse {
            success: true,
            error: None,
        })
    }

    async fn download(&self, path: &str) -> Result<DownloadPayload> {
        self.begin(&self.calls.download).await?;
        let path = normalize(path);
        let nodes = self.lock_nodes();
        match nodes.get(&path) {
            Some(node) if !node.is_dir => Ok(DownloadPayload {
                file_name: file_name(&path),
                data: node.data.clone(),
            }),
            Some(_) => Err(ProtocolError::rejected(
                Some(400),
                format!("cannot download a directory: {}", path),
            )),
            None => Err(ProtocolError::rejected(
                Some(404),
                format!("path not found: {}", path),
            )),
        }
    }

    async fn file_info(&self, path: &str) -> Result<FileInfo> {
        self.begin(&self.calls.info).await?;
        let path = normalize(path);
        let nodes = self.lock_nodes();
        Ok(match nodes.get(&path) {
            Some(node) => FileInfo {
                exists: true,
                is_dir: node.is_dir,
                file_name: file_name(&path),
                abs_path: path,
            },
            None => FileInfo {
                exists: false,
                is_dir: false,
                file_name: file_name(&path),
                abs_path: path,
            },
        })
    }
}

/// Normalize to an absolute, slash-separated path without trailing slash.
fn normalize(path: &str) -> String {
    let parts: Vec<&str> = path
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

fn parent_of(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    match path.rsplit_once('/') {
        Some(("", _)) => Some("/".to_string()),
        Some((parent, _)) => Some(parent.to_string()),
        None => None,
    }
}

fn file_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or_default().to_string()
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// `path` and all of its ancestors, root first.
fn ancestors(path: &str) -> Vec<String> {
    let mut chain = vec![path.to_string()];
    let mut current = path.to_string();
    while let Some(parent) = parent_of(&current) {
        chain.push(parent.clone());
        current = parent;
    }
    chain.reverse();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str, data: &[u8]) -> UploadPart {
        UploadPart {
            name: name.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("a/b/"), "/a/b");
        assert_eq!(normalize("//a/./b"), "/a/b");
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("/"), None);
        assert_eq!(parent_of("/a").as_deref(), Some("/"));
        assert_eq!(parent_of("/a/b").as_deref(), Some("/a"));
    }

    #[tokio::test]
    async fn test_list_root() {
        let service = MemoryFileService::new();
        service.add_dir("/docs");
        service.add_file("/readme.txt", "hello");
        service.add_file("/docs/nested.md", "x");

        let listing = service.list("").await.unwrap();
        assert_eq!(listing.current_path, "/");
        assert_eq!(listing.parent_path, "");
        let mut names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["docs", "readme.txt"]);
    }

    #[tokio::test]
    async fn test_list_nested_reports_parent() {
        let service = MemoryFileService::new();
        service.add_file("/a/b/c.txt", "x");

        let listing = service.list("/a/b").await.unwrap();
        assert_eq!(listing.current_path, "/a/b");
        assert_eq!(listing.parent_path, "/a");
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].size, 1);
    }

    #[tokio::test]
    async fn test_list_missing_is_rejected() {
        let service = MemoryFileService::new();
        let err = service.list("/nope").await.unwrap_err();
        assert!(matches!(err, ProtocolError::Rejected { status: Some(404), .. }));
    }

    #[tokio::test]
    async fn test_upload_blocks_per_file() {
        let service = MemoryFileService::new().with_blocked_extensions(["exe"]);
        let response = service
            .upload("/", vec![part("ok.txt", b"ok"), part("bad.exe", b"MZ")])
            .await
            .unwrap();

        assert!(service.contains("/ok.txt"));
        assert!(!service.contains("/bad.exe"));
        assert_eq!(response.failed.len(), 1);
        assert_eq!(response.failed[0].name, "bad.exe");
        assert_eq!(response.failed[0].error, "blocked");
    }

    #[tokio::test]
    async fn test_upload_keeps_refused_files_when_asked() {
        let service = MemoryFileService::new()
            .with_blocked_extensions(["exe"])
            .with_refused_files_kept();
        let response = service
            .upload("/", vec![part("ok.txt", b"ok"), part("bad.exe", b"MZ")])
            .await
            .unwrap();

        assert!(service.contains("/bad.exe"));
        assert_eq!(response.failed.len(), 1);
        let names: Vec<&str> = response.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bad.exe", "ok.txt"]);
    }

    #[tokio::test]
    async fn test_delete_directory_removes_children() {
        let service = MemoryFileService::new();
        service.add_file("/tmp/a/b.txt", "x");

        let response = service
            .delete(&DeleteRequest {
                path: "/tmp".to_string(),
                current_path: "/".to_string(),
            })
            .await
            .unwrap();
        assert!(response.success);
        assert!(!service.contains("/tmp"));
        assert!(!service.contains("/tmp/a/b.txt"));
    }

    #[tokio::test]
    async fn test_delete_missing_reports_error() {
        let service = MemoryFileService::new();
        let response = service
            .delete(&DeleteRequest {
                path: "/ghost".to_string(),
                current_path: "/".to_string(),
            })
            .await
            .unwrap();
        assert!(!response.success);
        assert!(response.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let service = MemoryFileService::new();
        service.fail_next(FailureMode::Network);
        assert!(matches!(service.list("/").await, Err(ProtocolError::Network(_))));
        assert!(service.list("/").await.is_ok());
        assert_eq!(service.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_file_info() {
        let service = MemoryFileService::new();
        service.add_file("/data/report.csv", "a,b");

        let info = service.file_info("/data/report.csv").await.unwrap();
        assert!(info.exists);
        assert!(!info.is_dir);
        assert_eq!(info.file_name, "report.csv");

        let info = service.file_info("/data").await.unwrap();
        assert!(info.is_dir);

        let info = service.file_info("/missing").await.unwrap();
        assert!(!info.exists);
    }

    #[tokio::test]
    async fn test_download_directory_rejected() {
        let service = MemoryFileService::new();
        service.add_dir("/d");
        assert!(service.download("/d").await.is_err());
    }
}
