//! # Warden Protocol Library
//!
//! Wire types shared by the Warden browser core and any remote file service
//! it talks to.
//!
//! ## Overview
//!
//! The service exposes five operations, and this crate defines the request
//! and response bodies for each:
//!
//! - **List**: [`ListResponse`] for a directory path
//! - **Upload**: a batch of [`UploadPart`]s answered by [`UploadResponse`]
//! - **Delete**: [`DeleteRequest`] answered by [`DeleteResponse`]
//! - **Download**: a [`DownloadPayload`]
//! - **Info**: [`FileInfo`] for resolving a path reference
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{FileEntry, ListResponse};
//!
//! let response = ListResponse {
//!     entries: vec![FileEntry::file("readme.md", "/readme.md", 120, 0)],
//!     current_path: "/".to_string(),
//!     parent_path: String::new(),
//! };
//! let json = serde_json::to_string(&response).unwrap();
//! assert!(json.contains("readme.md"));
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: Request and response bodies
//! - [`error`]: Error types

pub mod error;
pub mod messages;

pub use error::{ProtocolError, Result};
pub use messages::{
    DeleteRequest, DeleteResponse, DownloadPayload, ErrorBody, FileEntry, FileInfo, ListResponse,
    UploadFailure, UploadPart, UploadResponse,
};
