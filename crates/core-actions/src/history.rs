//! Ordered list of previously submitted logical lines with a navigation position.

use tracing::trace;

/// Default cap on retained entries.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Vec<char>>,
    /// Entry currently recalled by navigation; `None` while editing a fresh line.
    position: Option<usize>,
    /// Zero keeps every entry.
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            position: None,
            max_entries,
        }
    }

    /// Append a submitted line. Empty lines are ignored; navigation restarts from the newest entry.
    pub fn push(&mut self, line: &str) {
        self.position = None;
        if line.is_empty() {
            return;
        }
        self.entries.push(line.chars().collect());
        if self.max_entries > 0 && self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }
        trace!(target: "actions.history", len = self.entries.len(), "history_push");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[char]> {
        self.entries.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[char]> + '_ {
        self.entries.iter().map(Vec::as_slice)
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Step to the next older entry. `None` when there is nothing older.
    pub fn previous(&mut self) -> Option<&[char]> {
        let idx = match self.position {
            None => self.entries.len().checked_sub(1)?,
            Some(0) => return None,
            Some(i) => i - 1,
        };
        self.position = Some(idx);
        self.get(idx)
    }

    /// Step to the next newer entry. Stepping past the newest returns `None` and
    /// leaves navigation, i.e. back to the fresh line.
    pub fn next(&mut self) -> Option<&[char]> {
        match self.position {
            Some(i) if i + 1 < self.entries.len() => {
                self.position = Some(i + 1);
                self.get(i + 1)
            }
            _ => {
                self.position = None;
                None
            }
        }
    }
}
