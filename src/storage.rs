use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable storage behind history and the error log. File access goes
/// through this trait so tests can swap in an in-memory fake and so every
/// write on a given store is serialized by one lock.
pub trait Storage: Send + Sync {
    fn read_all(&self) -> Result<String>;
    fn write_all(&self, content: &str) -> Result<()>;
    fn append(&self, content: &str) -> Result<()>;
    fn truncate(&self) -> Result<()>;
    fn size(&self) -> Result<u64>;
    /// Archive the current content under `suffix` and restart empty.
    fn rotate(&self, suffix: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn read_all(&self) -> Result<String> {
        (**self).read_all()
    }
    fn write_all(&self, content: &str) -> Result<()> {
        (**self).write_all(content)
    }
    fn append(&self, content: &str) -> Result<()> {
        (**self).append(content)
    }
    fn truncate(&self) -> Result<()> {
        (**self).truncate()
    }
    fn size(&self) -> Result<u64> {
        (**self).size()
    }
    fn rotate(&self, suffix: &str) -> Result<()> {
        (**self).rotate(suffix)
    }
}

pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn read_all(&self) -> Result<String> {
        let _guard = self.lock.lock().unwrap();
        if !self.path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&self.path).with_context(|| format!("Failed to read {:?}", self.path))
    }

    fn write_all(&self, content: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        self.ensure_parent()?;
        fs::write(&self.path, content).with_context(|| format!("Failed to write {:?}", self.path))
    }

    fn append(&self, content: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        self.ensure_parent()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {:?}", self.path))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to append to {:?}", self.path))
    }

    fn truncate(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {:?}", self.path))?;
        }
        Ok(())
    }

    fn size(&self) -> Result<u64> {
        let _guard = self.lock.lock().unwrap();
        if !self.path.exists() {
            return Ok(0);
        }
        Ok(fs::metadata(&self.path)?.len())
    }

    fn rotate(&self, suffix: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        if !self.path.exists() {
            return Ok(());
        }
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string());
        let ext = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let archived = self
            .path
            .with_file_name(format!("{}_{}{}", stem, suffix, ext));
        fs::rename(&self.path, &archived)
            .with_context(|| format!("Failed to rotate {:?} -> {:?}", self.path, archived))
    }
}

/// In-memory store for tests. Rotation stashes the content aside so tests
/// can assert it happened.
#[derive(Default)]
pub struct MemoryStorage {
    content: Mutex<String>,
    archives: Mutex<Vec<(String, String)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn archives(&self) -> Vec<(String, String)> {
        self.archives.lock().unwrap().clone()
    }
}

impl Storage for MemoryStorage {
    fn read_all(&self) -> Result<String> {
        Ok(self.content.lock().unwrap().clone())
    }

    fn write_all(&self, content: &str) -> Result<()> {
        *self.content.lock().unwrap() = content.to_string();
        Ok(())
    }

    fn append(&self, content: &str) -> Result<()> {
        self.content.lock().unwrap().push_str(content);
        Ok(())
    }

    fn truncate(&self) -> Result<()> {
        self.content.lock().unwrap().clear();
        Ok(())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.content.lock().unwrap().len() as u64)
    }

    fn rotate(&self, suffix: &str) -> Result<()> {
        let mut content = self.content.lock().unwrap();
        self.archives
            .lock()
            .unwrap()
            .push((suffix.to_string(), content.clone()));
        content.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_file(name: &str) -> PathBuf {
        env::temp_dir().join(format!("pavterm_storage_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_file_append_and_read() {
        let path = temp_file("append.txt");
        let store = FileStorage::new(&path);
        store.truncate().unwrap();
        store.append("one\n").unwrap();
        store.append("two\n").unwrap();
        assert_eq!(store.read_all().unwrap(), "one\ntwo\n");
        store.truncate().unwrap();
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_file_missing_reads_empty() {
        let store = FileStorage::new(temp_file("missing.txt"));
        assert_eq!(store.read_all().unwrap(), "");
        assert_eq!(store.size().unwrap(), 0);
    }

    #[test]
    fn test_file_rotate() {
        let path = temp_file("rotate.log");
        let store = FileStorage::new(&path);
        store.write_all("old content").unwrap();
        store.rotate("20240101_abc123").unwrap();
        assert_eq!(store.read_all().unwrap(), "");
        let archived = path.with_file_name(format!(
            "{}_20240101_abc123.log",
            path.file_stem().unwrap().to_string_lossy()
        ));
        assert!(archived.exists());
        fs::remove_file(archived).unwrap();
    }

    #[test]
    fn test_memory_rotate_stashes() {
        let store = MemoryStorage::new();
        store.append("entry").unwrap();
        store.rotate("x").unwrap();
        assert_eq!(store.read_all().unwrap(), "");
        assert_eq!(store.archives().len(), 1);
        assert_eq!(store.archives()[0].1, "entry");
    }
}
