//! Extension-based risk classification.
//!
//! The security level is a display heuristic: it looks at the text after the
//! last `.` of the entry name and nothing else. File contents are never read.

use protocol::FileEntry;
use serde::{Deserialize, Serialize};

/// Executable and script extensions.
const CRITICAL_EXTENSIONS: &[&str] = &["exe", "bat", "cmd", "ps1", "sh", "py", "js", "php", "rb", "pl"];

/// Office document and archive extensions.
const VULNERABLE_EXTENSIONS: &[&str] = &[
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "pdf", "zip", "rar", "7z",
];

/// Plain text, data and image extensions.
const SECURE_EXTENSIONS: &[&str] = &["txt", "md", "json", "xml", "csv", "png", "jpg", "jpeg", "gif", "svg"];

/// Archive extensions. Drives the archive icon and the upload size-check bypass.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz"];

/// Heuristic risk label for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    /// Plain text, data or image.
    Secure,
    /// Office document or archive.
    Vulnerable,
    /// Executable or script.
    Critical,
    /// Anything else, including names without an extension.
    Unknown,
}

impl SecurityLevel {
    /// Fixed rank used by the security sort key.
    pub fn rank(self) -> u8 {
        match self {
            SecurityLevel::Secure => 0,
            SecurityLevel::Vulnerable => 1,
            SecurityLevel::Critical => 2,
            SecurityLevel::Unknown => 3,
        }
    }

    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityLevel::Secure => "secure",
            SecurityLevel::Vulnerable => "vulnerable",
            SecurityLevel::Critical => "critical",
            SecurityLevel::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display tag for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Folder,
    Archive,
    Secure,
    Vulnerable,
    Critical,
    Unknown,
}

impl Icon {
    /// Glyph shown by terminal renderers.
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Folder => "📁",
            Icon::Archive => "📦",
            Icon::Secure => "🟢",
            Icon::Vulnerable => "🟡",
            Icon::Critical => "🔴",
            Icon::Unknown => "📄",
        }
    }
}

/// Lowercased extension of `name`: the text after the last `.`.
///
/// Returns `None` when there is no dot or nothing follows it.
pub fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Returns true if `name` carries an archive extension.
pub fn is_archive(name: &str) -> bool {
    extension(name).is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext.as_str()))
}

/// Classify a name by its extension.
pub fn classify_name(name: &str) -> SecurityLevel {
    let Some(ext) = extension(name) else {
        return SecurityLevel::Unknown;
    };
    let ext = ext.as_str();

    if CRITICAL_EXTENSIONS.contains(&ext) {
        SecurityLevel::Critical
    } else if VULNERABLE_EXTENSIONS.contains(&ext) {
        SecurityLevel::Vulnerable
    } else if SECURE_EXTENSIONS.contains(&ext) {
        SecurityLevel::Secure
    } else {
        SecurityLevel::Unknown
    }
}

/// Classify an entry.
pub fn classify(entry: &FileEntry) -> SecurityLevel {
    classify_name(&entry.name)
}

/// Derive the display icon for an entry.
pub fn icon_for(entry: &FileEntry) -> Icon {
    if entry.is_dir {
        return Icon::Folder;
    }
    if is_archive(&entry.name) {
        return Icon::Archive;
    }
    match classify(entry) {
        SecurityLevel::Secure => Icon::Secure,
        SecurityLevel::Vulnerable => Icon::Vulnerable,
        SecurityLevel::Critical => Icon::Critical,
        SecurityLevel::Unknown => Icon::Unknown,
    }
}
