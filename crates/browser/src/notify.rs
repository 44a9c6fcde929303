//! Collaborator contracts between the browser core and its front end.
//!
//! The core never renders anything. It reports outcomes through a
//! [`Notifier`], upload progress through a [`ProgressSink`], asks a
//! [`ConfirmDelete`] hook before destructive calls and hands downloaded bytes
//! to a [`SaveTarget`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::entry::BrowserEntry;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives user-facing outcome messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Receives upload batch progress.
///
/// `advanced` is called once per file appended to the batch, so `current`
/// counts files, not bytes.
pub trait ProgressSink: Send + Sync {
    fn started(&self, total: usize);
    fn advanced(&self, current: usize, total: usize);
    fn finished(&self);
}

/// Asked before a delete request is sent.
pub trait ConfirmDelete: Send + Sync {
    /// Returns true to go ahead with deleting `entry`.
    fn confirm(&self, entry: &BrowserEntry) -> bool;
}

impl<F> ConfirmDelete for F
where
    F: Fn(&BrowserEntry) -> bool + Send + Sync,
{
    fn confirm(&self, entry: &BrowserEntry) -> bool {
        self(entry)
    }
}

/// Destination for downloaded file contents.
pub trait SaveTarget: Send + Sync {
    fn save(&self, name: &str, data: &[u8]) -> io::Result<()>;
}

/// Notifier that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _message: &str, _severity: Severity) {}
}

/// Progress sink that ignores all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn started(&self, _total: usize) {}
    fn advanced(&self, _current: usize, _total: usize) {}
    fn finished(&self) {}
}

/// Writes downloads into a local directory.
///
/// Contents go to a temporary file first and are renamed into place, so a
/// failed save never leaves a truncated file under the final name.
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    dir: PathBuf,
}

impl DirectorySaveTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectorySaveTarget {
    fn save(&self, name: &str, data: &[u8]) -> io::Result<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to save under name {:?}", name),
            ));
        }

        fs::create_dir_all(&self.dir)?;
        let final_path = self.dir.join(name);
        let temp_path = self.dir.join(format!(".{}.part", name));

        let result = (|| {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(data)?;
            file.sync_all()?;
            fs::rename(&temp_path, &final_path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}
