//! Navigation history for the browser session.

/// Stack of previously visited paths.
///
/// Unbounded and never persisted; the session clears it whenever the browser
/// is opened fresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationHistory {
    /// Visited paths, oldest first.
    entries: Vec<String>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every visited path.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Record `leaving` before moving to `destination`.
    ///
    /// Nothing is recorded when the two are equal. Returns whether a path
    /// was pushed.
    pub fn push(&mut self, leaving: &str, destination: &str) -> bool {
        if leaving == destination {
            return false;
        }
        self.entries.push(leaving.to_string());
        true
    }

    /// Remove and return the most recent path.
    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop()
    }

    /// Most recent path without removing it.
    pub fn peek(&self) -> Option<&str> {
        self.entries.last().map(|s| s.as_str())
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
