//! Remote file service contract and its implementations.
//!
//! The browser never talks to a transport directly: every listing, upload,
//! delete, download and info lookup goes through [`FileService`].
//!
//! - [`HttpFileService`]: HTTP/JSON client for a running service
//! - [`MemoryFileService`]: in-process service over an in-memory tree

pub mod http;
pub mod memory;

use protocol::{
    DeleteRequest, DeleteResponse, DownloadPayload, FileInfo, ListResponse, Result, UploadPart,
    UploadResponse,
};

pub use http::HttpFileService;
pub use memory::{FailureMode, MemoryFileService};

/// Operations the remote file service must supply.
///
/// Implementations must be safe to share between the components of one
/// session.
#[allow(async_fn_in_trait)]
pub trait FileService: Send + Sync {
    /// List the directory at `path`.
    async fn list(&self, path: &str) -> Result<ListResponse>;

    /// Upload a batch of files into the directory at `path`.
    async fn upload(&self, path: &str, parts: Vec<UploadPart>) -> Result<UploadResponse>;

    /// Delete a single entry.
    async fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse>;

    /// Fetch the contents of the file at `path`.
    async fn download(&self, path: &str) -> Result<DownloadPayload>;

    /// Resolve a path reference.
    async fn file_info(&self, path: &str) -> Result<FileInfo>;
}
