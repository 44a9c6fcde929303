//! Sort order for listings. Applied at render time, never stored.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::entry::BrowserEntry;

/// Column an entry listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Date,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Session-scoped sort preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub by: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(by: SortKey, direction: SortDirection) -> Self {
        Self { by, direction }
    }

    /// Select a sort column.
    ///
    /// Selecting the active column flips the direction; a new column starts
    /// ascending.
    pub fn select(&mut self, key: SortKey) {
        if self.by == key {
            self.direction = self.direction.flipped();
        } else {
            self.by = key;
            self.direction = SortDirection::Asc;
        }
    }

    fn compare_keys(&self, a: &BrowserEntry, b: &BrowserEntry) -> Ordering {
        let ordering = match self.by {
            SortKey::Name => a.name().cmp(b.name()),
            SortKey::Size => a.size().cmp(&b.size()),
            SortKey::Date => a.modified().cmp(&b.modified()),
            SortKey::Security => a.security_level.rank().cmp(&b.security_level.rank()),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Total comparator: directories first, then the key in the chosen direction.
    pub fn compare(&self, a: &BrowserEntry, b: &BrowserEntry) -> Ordering {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| self.compare_keys(a, b))
    }
}

/// Return a sorted copy of `entries`. The sort is stable and the input is
/// left untouched.
pub fn sort_entries(entries: &[BrowserEntry], spec: &SortSpec) -> Vec<BrowserEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| spec.compare(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::FileEntry;

    fn file(name: &str, size: u64, modified: u64) -> BrowserEntry {
        BrowserEntry::from_remote(FileEntry::file(name, format!("/{}", name), size, modified))
    }

    fn dir(name: &str) -> BrowserEntry {
        BrowserEntry::from_remote(FileEntry::directory(name, format!("/{}", name), 0))
    }

    fn names(entries: &[BrowserEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name()).collect()
    }

    #[test]
    fn test_directories_first_by_name() {
        let entries = vec![dir("dirB"), file("fileA", 1, 0), dir("dirA")];
        let sorted = sort_entries(&entries, &SortSpec::new(SortKey::Name, SortDirection::Asc));
        assert_eq!(names(&sorted), vec!["dirA", "dirB", "fileA"]);
    }

    #[test]
    fn test_directories_first_when_descending() {
        let entries = vec![file("zeta", 1, 0), dir("alpha"), file("beta", 1, 0)];
        let sorted = sort_entries(&entries, &SortSpec::new(SortKey::Name, SortDirection::Desc));
        assert_eq!(names(&sorted), vec!["alpha", "zeta", "beta"]);
    }

    #[test]
    fn test_directories_first_for_every_key() {
        let entries = vec![file("a.txt", 999, 999), dir("z"), file("b.exe", 0, 0)];
        for by in [SortKey::Name, SortKey::Size, SortKey::Date, SortKey::Security] {
            for direction in [SortDirection::Asc, SortDirection::Desc] {
                let sorted = sort_entries(&entries, &SortSpec::new(by, direction));
                assert!(sorted[0].is_dir(), "{:?} {:?}", by, direction);
            }
        }
    }

    #[test]
    fn test_name_is_case_aware() {
        let entries = vec![file("banana", 1, 0), file("Apple", 1, 0), file("apple", 1, 0)];
        let sorted = sort_entries(&entries, &SortSpec::default());
        assert_eq!(names(&sorted), vec!["Apple", "apple", "banana"]);
    }

    #[test]
    fn test_size_numeric() {
        let entries = vec![file("big", 1000, 0), file("small", 9, 0), file("mid", 100, 0)];
        let sorted = sort_entries(&entries, &SortSpec::new(SortKey::Size, SortDirection::Asc));
        assert_eq!(names(&sorted), vec!["small", "mid", "big"]);

        let sorted = sort_entries(&entries, &SortSpec::new(SortKey::Size, SortDirection::Desc));
        assert_eq!(names(&sorted), vec!["big", "mid", "small"]);
    }

    #[test]
    fn test_date_chronological() {
        let entries = vec![file("new", 1, 300), file("old", 1, 100), file("mid", 1, 200)];
        let sorted = sort_entries(&entries, &SortSpec::new(SortKey::Date, SortDirection::Asc));
        assert_eq!(names(&sorted), vec!["old", "mid", "new"]);
    }

    #[test]
    fn test_security_rank() {
        let entries = vec![
            file("x.bin", 1, 0),
            file("x.exe", 1, 0),
            file("x.pdf", 1, 0),
            file("x.txt", 1, 0),
        ];
        let sorted = sort_entries(&entries, &SortSpec::new(SortKey::Security, SortDirection::Asc));
        assert_eq!(names(&sorted), vec!["x.txt", "x.pdf", "x.exe", "x.bin"]);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let entries = vec![file("c", 5, 0), file("a", 5, 0), file("b", 5, 0)];
        let sorted = sort_entries(&entries, &SortSpec::new(SortKey::Size, SortDirection::Asc));
        assert_eq!(names(&sorted), vec!["c", "a", "b"]);

        let sorted = sort_entries(&entries, &SortSpec::new(SortKey::Size, SortDirection::Desc));
        assert_eq!(names(&sorted), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_input_not_mutated() {
        let entries = vec![file("b", 1, 0), file("a", 1, 0)];
        let before = entries.clone();
        let _ = sort_entries(&entries, &SortSpec::default());
        assert_eq!(entries, before);
    }

    #[test]
    fn test_select_same_key_toggles() {
        let mut spec = SortSpec::default();
        spec.select(SortKey::Name);
        assert_eq!(spec.direction, SortDirection::Desc);
        spec.select(SortKey::Name);
        assert_eq!(spec.direction, SortDirection::Asc);
    }

    #[test]
    fn test_select_new_key_resets_ascending() {
        let mut spec = SortSpec::new(SortKey::Name, SortDirection::Desc);
        spec.select(SortKey::Size);
        assert_eq!(spec, SortSpec::new(SortKey::Size, SortDirection::Asc));
    }
}
