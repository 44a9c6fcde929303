//! # Warden Browser Library
//!
//! Client-side core of the Warden remote file browser.
//!
//! ## Overview
//!
//! The browser keeps the listing of one remote working directory and lets a
//! front end act on it:
//!
//! - **Listing & Navigation**: fetch, navigate into, up and back
//! - **Classification**: heuristic risk label and icon per entry, from the
//!   file extension only
//! - **Sorting**: directories first, then by name, size, date or risk
//! - **Uploads**: validated multi-file batches with per-file progress and
//!   partial-failure reporting
//! - **File Operations**: confirmed delete and download
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     BrowserSession                      │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐ ┌──────────────┐ ┌───────────────┐  │
//! │  │ DirectoryList- │ │    Upload    │ │     File      │  │
//! │  │   ingStore     │ │   Pipeline   │ │  Operations   │  │
//! │  └────────────────┘ └──────────────┘ └───────────────┘  │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │                FileService (trait)                │  │
//! │  └───────────────────────────────────────────────────┘  │
//! │  ┌──────────────────────┐  ┌─────────────────────────┐  │
//! │  │   HttpFileService    │  │    MemoryFileService    │  │
//! │  └──────────────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use browser::{BrowserSession, Config, HttpFileService, SilentNotifier};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_default()?;
//!     let service = HttpFileService::from_config(&config.service)?;
//!     let session = BrowserSession::new(service, &config, Arc::new(SilentNotifier));
//!
//!     session.open().await?;
//!     for entry in session.sorted_entries().await {
//!         println!("{} {}", entry.icon.glyph(), entry.name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`session`]: The per-instance facade
//! - [`listing`]: Listing state and navigation
//! - [`upload`]: Upload validation and batching
//! - [`operations`]: Delete and download
//! - [`classify`]: Extension-based classification
//! - [`sort`]: Display ordering
//! - [`history`]: Navigation history
//! - [`service`]: Remote file service contract and clients
//! - [`notify`]: Front-end collaborator traits
//! - [`config`]: Configuration file handling

pub mod cancel;
pub mod classify;
pub mod config;
pub mod entry;
pub mod error;
pub mod history;
pub mod listing;
pub mod notify;
pub mod operations;
pub mod service;
pub mod session;
pub mod sort;
pub mod upload;

pub use cancel::CancelHandle;
pub use classify::{classify, icon_for, Icon, SecurityLevel};
pub use config::{default_config_path, Config, ConfigError};
pub use entry::{BrowserEntry, UploadStatus};
pub use error::{BrowserError, BrowserResult};
pub use history::NavigationHistory;
pub use listing::{DirectoryListing, DirectoryListingStore};
pub use notify::{
    ConfirmDelete, DirectorySaveTarget, NoProgress, Notifier, ProgressSink, SaveTarget, Severity,
    SilentNotifier,
};
pub use operations::{DeleteOutcome, DownloadOutcome, FileOperations};
pub use protocol::{FileEntry, FileInfo, UploadFailure};
pub use service::{FailureMode, FileService, HttpFileService, MemoryFileService};
pub use session::{BrowserSession, BrowserSnapshot, OpenOutcome};
pub use sort::{sort_entries, SortDirection, SortKey, SortSpec};
pub use upload::{
    validate, RejectionReason, UploadBatch, UploadCandidate, UploadPipeline, UploadReport,
    ValidationRejection,
};
