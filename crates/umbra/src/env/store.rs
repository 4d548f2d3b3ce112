//! Preference storage backends.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use super::PreferenceStore;
use crate::error::ThemeError;

/// A JSON object file of string entries.
///
/// ```json
/// {
///   "theme": "dark"
/// }
/// ```
///
/// A missing file reads as empty. A file that is not a JSON object also reads
/// as empty and is replaced on the next write; entries with other keys are
/// kept whenever the file is valid. A file that exists but cannot be read is
/// never overwritten.
///
/// Writes go to a temporary file in the same directory, renamed over the
/// target, so a crash mid-write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, ThemeError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(ThemeError::io(&self.path, err)),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "preference file is not a JSON object");
                Ok(Map::new())
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "corrupt preference file");
                Ok(Map::new())
            }
        }
    }

    fn write_entries(&self, entries: Map<String, Value>) -> Result<(), ThemeError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| ThemeError::io(parent, e))?;
                parent
            }
            None => Path::new("."),
        };

        let mut content = serde_json::to_string_pretty(&Value::Object(entries))?;
        content.push('\n');

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ThemeError::io(dir, e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| ThemeError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| ThemeError::io(&self.path, e.error))?;
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        let entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "cannot read preference file");
                return None;
            }
        };
        entries.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn store(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.write_entries(entries)?;
        tracing::debug!(path = %self.path.display(), key, value, "stored preference");
        Ok(())
    }
}

/// An in-memory store shared between clones. Counts reads and writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryStoreState>>,
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    values: HashMap<String, String>,
    reads: usize,
    writes: usize,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail.
    pub fn read_only() -> Self {
        let store = Self::new();
        store.inner.borrow_mut().read_only = true;
        store
    }

    /// Seed an entry.
    pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner
            .borrow_mut()
            .values
            .insert(key.into(), value.into());
        self
    }

    /// Peek at an entry without counting a read.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().values.get(key).cloned()
    }

    pub fn reads(&self) -> usize {
        self.inner.borrow().reads
    }

    /// Number of attempted writes, failed ones included.
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        let mut state = self.inner.borrow_mut();
        state.reads += 1;
        state.values.get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) -> Result<(), ThemeError> {
        let mut state = self.inner.borrow_mut();
        state.writes += 1;
        if state.read_only {
            return Err(ThemeError::io(
                "<memory>",
                io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only"),
            ));
        }
        state.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
