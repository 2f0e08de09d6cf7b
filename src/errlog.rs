use crate::storage::Storage;
use blake3::Hasher;
use chrono::{DateTime, Local};
use regex::Regex;
use std::collections::VecDeque;
use std::sync::Mutex;

pub const DEFAULT_WINDOW: usize = 50;

#[derive(Debug, Clone)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Local>,
    pub category: String,
    pub message: String,
    pub stack_trace: Option<String>,
}

pub fn strip_ansi(content: &str) -> String {
    let re = Regex::new(r"\x1b\[[0-9;]*m").unwrap();
    re.replace_all(content, "").to_string()
}

/// Structured failure log. Errors land in a bounded in-memory window and in
/// the backing store as human-readable blocks; warnings and info lines go
/// to the store only. Logging never propagates its own failures.
pub struct ErrorLogger {
    window: Mutex<VecDeque<ErrorEntry>>,
    window_cap: usize,
    store: Box<dyn Storage>,
    rotate_max_bytes: Option<u64>,
}

impl ErrorLogger {
    pub fn new(store: Box<dyn Storage>, window_cap: usize, rotate_max_bytes: Option<u64>) -> Self {
        Self {
            window: Mutex::new(VecDeque::new()),
            window_cap,
            store,
            rotate_max_bytes,
        }
    }

    pub fn log_error(&self, category: &str, message: &str, stack_trace: Option<&str>) {
        let entry = ErrorEntry {
            timestamp: Local::now(),
            category: category.to_string(),
            message: message.to_string(),
            stack_trace: stack_trace.map(|s| s.to_string()),
        };

        {
            let mut window = self.window.lock().unwrap();
            window.push_back(entry.clone());
            while window.len() > self.window_cap {
                window.pop_front();
            }
        }

        self.write_block(&entry.category, &entry.message, entry.stack_trace.as_deref());
    }

    /// Lighter-weight variants: same file format and category tagging as
    /// `log_error`, but they skip the structured window and echo at their
    /// severity through the host logger instead.
    pub fn log_warning(&self, category: &str, message: &str) {
        log::warn!("{}: {}", category, message);
        self.write_block(category, message, None);
    }

    pub fn log_info(&self, category: &str, message: &str) {
        log::info!("{}: {}", category, message);
        self.write_block(category, message, None);
    }

    /// Snapshot of the in-memory window, oldest first.
    pub fn recent(&self) -> Vec<ErrorEntry> {
        self.window.lock().unwrap().iter().cloned().collect()
    }

    fn write_block(&self, category: &str, message: &str, stack_trace: Option<&str>) {
        self.rotate_if_needed();

        let now = Local::now();
        let mut block = format!(
            "[{}] {}: {}\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            category,
            strip_ansi(message)
        );
        if let Some(trace) = stack_trace {
            block.push_str("Stack Trace:\n");
            block.push_str(&strip_ansi(trace));
            if !trace.ends_with('\n') {
                block.push('\n');
            }
        }
        block.push_str("---\n");

        if let Err(e) = self.store.append(&block) {
            log::warn!("Failed to append error log entry: {}", e);
        }
    }

    fn rotate_if_needed(&self) {
        let Some(max) = self.rotate_max_bytes else {
            return;
        };
        let size = match self.store.size() {
            Ok(s) => s,
            Err(_) => return,
        };
        if size < max {
            return;
        }

        let now = Local::now();
        let date_str = now.format("%Y-%m-%d").to_string();
        let time_str = now.format("%H%M%S").to_string();

        // Short Hash
        let mut hasher = Hasher::new();
        hasher.update(date_str.as_bytes());
        hasher.update(time_str.as_bytes());
        let hash_full = hasher.finalize().to_hex().to_string();
        let short_hash = &hash_full[0..6];

        let suffix = format!("{}_{}", date_str, short_hash);
        if let Err(e) = self.store.rotate(&suffix) {
            log::warn!("Failed to rotate error log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn logger_with_store(cap: usize, rotate: Option<u64>) -> (ErrorLogger, Arc<MemoryStorage>) {
        // The logger owns its store; keep a second handle for assertions.
        let store = Arc::new(MemoryStorage::new());
        let view = store.clone();
        (ErrorLogger::new(Box::new(store), cap, rotate), view)
    }

    #[test]
    fn test_block_format() {
        let (logger, store) = logger_with_store(10, None);
        logger.log_error("EXECUTION", "spawn failed", Some("at line 1"));
        let content = store.read_all().unwrap();
        assert!(content.contains("] EXECUTION: spawn failed\n"));
        assert!(content.contains("Stack Trace:\nat line 1\n"));
        assert!(content.ends_with("---\n"));
    }

    #[test]
    fn test_window_is_bounded() {
        let (logger, _) = logger_with_store(3, None);
        for i in 0..10 {
            logger.log_error("EXECUTION", &format!("err {}", i), None);
        }
        let recent = logger.recent();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message, "err 7");
        assert_eq!(recent[2].message, "err 9");
    }

    #[test]
    fn test_warning_and_info_skip_window() {
        let (logger, store) = logger_with_store(10, None);
        logger.log_warning("EXECUTION", "something odd");
        logger.log_info("HISTORY", "store reloaded");
        assert!(logger.recent().is_empty());
        let content = store.read_all().unwrap();
        assert!(content.contains("EXECUTION: something odd"));
        assert!(content.contains("HISTORY: store reloaded"));
    }

    #[test]
    fn test_ansi_stripped() {
        let (logger, store) = logger_with_store(10, None);
        logger.log_error("EXECUTION", "\x1b[31mred error\x1b[0m", None);
        let content = store.read_all().unwrap();
        assert!(content.contains("red error"));
        assert!(!content.contains('\x1b'));
    }

    #[test]
    fn test_rotation_at_cap() {
        let (logger, store) = logger_with_store(10, Some(64));
        for i in 0..10 {
            logger.log_error("EXECUTION", &format!("padding padding padding {}", i), None);
        }
        assert!(!store.archives().is_empty());
        assert!(store.size().unwrap() < 256);
    }

    #[test]
    fn test_unbounded_when_disabled() {
        let (logger, store) = logger_with_store(10, None);
        for i in 0..20 {
            logger.log_error("EXECUTION", &format!("entry {}", i), None);
        }
        assert!(store.archives().is_empty());
        assert_eq!(store.read_all().unwrap().matches("---\n").count(), 20);
    }
}
