use crate::storage::Storage;
use anyhow::Result;
use std::collections::VecDeque;

pub const DEFAULT_LIMIT: usize = 100;

/// Capped command history persisted through the storage port, one command
/// per line with the newest at the end. Immediate repeats are suppressed;
/// the same command further back is kept.
pub struct HistoryStore {
    entries: VecDeque<String>,
    limit: usize,
    store: Box<dyn Storage>,
}

impl HistoryStore {
    /// Loads the last `limit` persisted entries.
    pub fn load(store: Box<dyn Storage>, limit: usize) -> Result<Self> {
        let content = store.read_all()?;
        let mut entries: VecDeque<String> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.to_string())
            .collect();
        while entries.len() > limit {
            entries.pop_front();
        }
        Ok(Self {
            entries,
            limit,
            store,
        })
    }

    pub fn add(&mut self, command: &str) {
        let command = command.trim();
        if command.is_empty() {
            return;
        }
        if self.entries.back().map(|s| s.as_str()) == Some(command) {
            return;
        }

        self.entries.push_back(command.to_string());
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }

        if let Err(e) = self.persist() {
            log::warn!("Failed to persist history: {}", e);
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.store.truncate()
    }

    fn persist(&self) -> Result<()> {
        let mut content = self
            .entries
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        self.store.write_all(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn empty_store(limit: usize) -> (HistoryStore, Arc<MemoryStorage>) {
        let store = Arc::new(MemoryStorage::new());
        let view = store.clone();
        (HistoryStore::load(Box::new(store), limit).unwrap(), view)
    }

    #[test]
    fn test_adjacent_dedup() {
        let (mut history, _) = empty_store(10);
        history.add("ls");
        history.add("ls");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_non_adjacent_repeats_kept() {
        let (mut history, _) = empty_store(10);
        history.add("ls");
        history.add("pwd");
        history.add("ls");
        assert_eq!(history.entries(), vec!["ls", "pwd", "ls"]);
    }

    #[test]
    fn test_blank_ignored() {
        let (mut history, _) = empty_store(10);
        history.add("");
        history.add("   ");
        assert!(history.is_empty());
    }

    #[test]
    fn test_fifo_eviction_at_cap() {
        let (mut history, _) = empty_store(3);
        for cmd in ["a", "b", "c", "d", "e"] {
            history.add(cmd);
        }
        assert_eq!(history.entries(), vec!["c", "d", "e"]);
    }

    #[test]
    fn test_persists_one_per_line() {
        let (mut history, store) = empty_store(10);
        history.add("echo hi");
        history.add("pwd");
        assert_eq!(store.read_all().unwrap(), "echo hi\npwd\n");
    }

    #[test]
    fn test_reload_from_storage() {
        let store = Arc::new(MemoryStorage::new());
        store.write_all("one\ntwo\nthree\n").unwrap();
        let history = HistoryStore::load(Box::new(store.clone()), 2).unwrap();
        // Oldest entries beyond the cap are dropped on load
        assert_eq!(history.entries(), vec!["two", "three"]);
    }

    #[test]
    fn test_clear_truncates_store() {
        let (mut history, store) = empty_store(10);
        history.add("ls");
        history.clear().unwrap();
        assert!(history.is_empty());
        assert_eq!(store.read_all().unwrap(), "");
    }

    #[test]
    fn test_get_out_of_range() {
        let (mut history, _) = empty_store(10);
        history.add("ls");
        assert_eq!(history.get(0), Some("ls"));
        assert_eq!(history.get(5), None);
    }
}
