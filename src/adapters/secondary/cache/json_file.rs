/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! JSON file cache store for resolved names

use crate::domain::{CacheDocument, SystemError};
use crate::ports::CacheStore;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores the cache document as pretty-printed JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFileCacheStore;

impl JsonFileCacheStore {
    /// Create a new JSON cache store
    pub fn new() -> Self {
        Self
    }

    /// Sibling path the document is written to before being renamed into place
    fn staging_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ids_cache.json".into());
        name.push(format!(".{}.tmp", std::process::id()));
        path.with_file_name(name)
    }
}

impl CacheStore for JsonFileCacheStore {
    fn load(&self, path: &Path) -> CacheDocument {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No usable cache at {}: {}", path.display(), e);
                return CacheDocument::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            debug!("Discarding undecodable cache at {}: {}", path.display(), e);
            CacheDocument::default()
        })
    }

    fn save(&self, path: &Path, document: &CacheDocument) -> Result<(), SystemError> {
        let json_string = serde_json::to_string_pretty(document)
            .map_err(|e| SystemError::Serialization(format!("JSON serialization failed: {}", e)))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SystemError::io(parent, &e))?;
        }

        let staging = Self::staging_path(path);
        fs::write(&staging, json_string).map_err(|e| {
            let _ = fs::remove_file(&staging);
            SystemError::io(&staging, &e)
        })?;
        fs::rename(&staging, path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            SystemError::io(path, &e)
        })?;

        debug!("Wrote cache document to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HardwareId, ResolvedCatalog, ResolvedEntry};
    use tempfile::tempdir;

    fn sample_document() -> CacheDocument {
        let mut catalog = ResolvedCatalog::default();
        catalog
            .usb
            .entry(HardwareId::parse("046d").unwrap())
            .or_default()
            .insert(
                HardwareId::parse("c52b").unwrap(),
                ResolvedEntry {
                    vendor_name: "Logitech, Inc.".to_string(),
                    device_name: "Unifying Receiver".to_string(),
                },
            );
        CacheDocument::new(catalog)
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ids_cache.json");
        let store = JsonFileCacheStore::new();

        store.save(&path, &sample_document()).unwrap();

        assert_eq!(store.load(&path), sample_document());
        assert!(!JsonFileCacheStore::staging_path(&path).exists());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let store = JsonFileCacheStore::new();
        assert_eq!(
            store.load(&temp_dir.path().join("absent.json")),
            CacheDocument::default()
        );
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ids_cache.json");
        fs::write(&path, "{\"hw\": {\"pci\": [").unwrap();

        assert_eq!(JsonFileCacheStore::new().load(&path), CacheDocument::default());
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested").join("cache").join("ids.json");

        JsonFileCacheStore::new()
            .save(&nested_path, &sample_document())
            .unwrap();

        assert!(nested_path.exists());
    }

    #[test]
    fn test_save_into_file_as_directory_fails() {
        let temp_dir = tempdir().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let result = JsonFileCacheStore::new().save(&blocker.join("ids.json"), &sample_document());
        assert!(matches!(result, Err(SystemError::Io { .. })));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_removes_staging_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ids_cache.json");
        let staging = JsonFileCacheStore::staging_path(&path);
        // every write to /dev/full fails with ENOSPC after the open succeeds
        std::os::unix::fs::symlink("/dev/full", &staging).unwrap();

        let result = JsonFileCacheStore::new().save(&path, &sample_document());

        assert!(matches!(result, Err(SystemError::Io { .. })));
        assert!(fs::symlink_metadata(&staging).is_err());
        assert!(!path.exists());
    }
}
