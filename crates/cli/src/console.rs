//! Terminal implementations of the browser's front-end collaborators.

use std::io::{self, BufRead, Write};

use browser::{BrowserEntry, ConfirmDelete, Notifier, ProgressSink, Severity};

/// Prints notifications to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        eprintln!("{} {}", severity_tag(severity), message);
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "[info]",
        Severity::Success => "[ok]",
        Severity::Warning => "[warn]",
        Severity::Error => "[error]",
    }
}

/// Prints one progress line per file appended to the batch.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn started(&self, total: usize) {
        eprintln!("Uploading {} file(s)...", total);
    }

    fn advanced(&self, current: usize, total: usize) {
        eprintln!("  [{}/{}]", current, total);
    }

    fn finished(&self) {}
}

/// Asks on the terminal before deleting. `assume_yes` skips the prompt.
pub struct PromptConfirm {
    pub assume_yes: bool,
}

impl ConfirmDelete for PromptConfirm {
    fn confirm(&self, entry: &BrowserEntry) -> bool {
        if self.assume_yes {
            return true;
        }

        let kind = if entry.is_dir() { "directory" } else { "file" };
        eprint!("Delete {} {}? [y/N] ", kind, entry.path());
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Print entries as a table.
pub fn print_listing(current_path: &str, entries: &[BrowserEntry]) {
    println!("{}", current_path);

    if entries.is_empty() {
        println!("  (empty)");
        return;
    }

    let name_width = entries
        .iter()
        .map(|e| e.name().len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "  {:<2} {:<name_width$}  {:>10}  {:<10}",
        "",
        "NAME",
        "SIZE",
        "LEVEL",
        name_width = name_width
    );
    for entry in entries {
        println!("  {}", format_row(entry, name_width));
    }
    println!();
    println!("{} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
}

fn format_row(entry: &BrowserEntry, name_width: usize) -> String {
    let size = if entry.is_dir() {
        "-".to_string()
    } else {
        format_size(entry.size())
    };
    format!(
        "{:<2} {:<name_width$}  {:>10}  {:<10}",
        entry.icon.glyph(),
        entry.name(),
        size,
        entry.security_level.as_str(),
        name_width = name_width
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser::FileEntry;

    fn entry(name: &str, path: &str, is_dir: bool, size: u64) -> BrowserEntry {
        let remote = if is_dir {
            FileEntry::directory(name, path, 0)
        } else {
            FileEntry::file(name, path, size, 0)
        };
        BrowserEntry::from_remote(remote)
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KiB");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(150 * 1024 * 1024), "150.0 MiB");
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes("  YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
    }

    #[test]
    fn test_confirm_assume_yes_skips_prompt() {
        let confirm = PromptConfirm { assume_yes: true };
        let entry = entry("a.txt", "/a.txt", false, 3);
        assert!(confirm.confirm(&entry));
    }

    #[test]
    fn test_format_row_directory_has_no_size() {
        let entry = entry("src", "/src", true, 0);
        let row = format_row(&entry, 6);
        assert!(row.contains("src"));
        assert!(row.contains(" - "));
    }
}
