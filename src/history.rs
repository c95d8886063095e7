//! Command history consulted by `!` event designators.

use serde::Serialize;

/// Read access to previously entered lines, most recent last.
pub trait HistoryLog {
    fn entries(&self) -> &[String];
}

impl HistoryLog for Vec<String> {
    fn entries(&self) -> &[String] {
        self
    }
}

impl HistoryLog for [String] {
    fn entries(&self) -> &[String] {
        self
    }
}

/// In-memory history with a retention cap.
#[derive(Debug, Clone, Serialize)]
pub struct History {
    entries: Vec<String>,
    max_entries: usize,
}

impl History {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Record a line. Blank lines and repeats of the latest entry are
    /// skipped. Returns true if the line was stored.
    pub fn push(&mut self, line: &str) -> bool {
        let line = line.trim_end_matches('\n');
        if line.trim().is_empty() {
            return false;
        }
        if self.entries.last().is_some_and(|last| last == line) {
            return false;
        }
        self.entries.push(line.to_string());
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(2000)
    }
}

impl HistoryLog for History {
    fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_repeated() {
        let mut h = History::default();
        assert!(h.push("ls"));
        assert!(!h.push("ls"));
        assert!(!h.push("   "));
        assert!(h.push("pwd"));
        assert_eq!(h.entries(), ["ls", "pwd"]);
    }

    #[test]
    fn drops_oldest_past_cap() {
        let mut h = History::new(2);
        h.push("a");
        h.push("b");
        h.push("c");
        assert_eq!(h.entries(), ["b", "c"]);
    }
}
