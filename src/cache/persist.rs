//! File-backed persistent cache
//!
//! Stores each entry as `<dir>/<key>.json`, holding the raw text exactly as
//! it was fetched.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::PersistentCache;
use crate::error::{ResolverError, ResolverResult};

/// Extension of entry files
const ENTRY_EXTENSION: &str = "json";

/// Persistence manager for cached catalogs
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Directory holding one file per key
    base_dir: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `dir`; the directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.base_dir
    }

    /// Keys are limited to `[A-Za-z0-9_-]` so they cannot leave the directory.
    fn is_valid_key(key: &str) -> bool {
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    /// Get the entry file path for a key
    fn entry_path(&self, key: &str) -> ResolverResult<PathBuf> {
        if !Self::is_valid_key(key) {
            return Err(ResolverError::InvalidCacheKey {
                key: key.to_string(),
            });
        }
        Ok(self.base_dir.join(format!("{key}.{ENTRY_EXTENSION}")))
    }

    /// Remove every entry, leaving the directory in place.
    pub fn clear(&self) -> ResolverResult<usize> {
        let keys = self.keys()?;
        for key in &keys {
            self.remove(key)?;
        }
        Ok(keys.len())
    }
}

impl PersistentCache for FileCache {
    fn get(&self, key: &str) -> ResolverResult<Option<String>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ResolverError::cache_io(path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> ResolverResult<()> {
        let path = self.entry_path(key)?;

        // Ensure directory exists
        fs::create_dir_all(&self.base_dir)
            .map_err(|e| ResolverError::cache_io(self.base_dir.clone(), e))?;

        fs::write(&path, value).map_err(|e| ResolverError::cache_io(path, e))
    }

    fn remove(&self, key: &str) -> ResolverResult<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ResolverError::cache_io(path, e)),
        }
    }

    fn keys(&self) -> ResolverResult<Vec<String>> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ResolverError::cache_io(self.base_dir.clone(), e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ResolverError::cache_io(self.base_dir.clone(), e))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            // Foreign files that could never have been written under a key
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if Self::is_valid_key(stem) => keys.push(stem.to_string()),
                _ => {}
            }
        }
        keys.sort();
        Ok(keys)
    }
}
