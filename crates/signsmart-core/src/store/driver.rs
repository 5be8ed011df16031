use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::StoreError;

/// Key/value blob storage holding one JSON document per key.
///
/// Reads hand back raw bytes; decoding is the store's job so that a blob
/// which is not valid UTF-8 counts as corrupt rather than unreadable.
pub trait StorageDriver {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Process-local storage, mostly for tests
#[derive(Debug, Default)]
pub struct MemoryDriver {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key with raw content
    pub fn with_blob(self, key: &str, value: impl AsRef<[u8]>) -> Self {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(key.to_string(), value.as_ref().to_vec());
        }
        self
    }
}

impl StorageDriver for MemoryDriver {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let blobs = self.blobs.lock().map_err(|_| poisoned(key))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut blobs = self.blobs.lock().map_err(|_| poisoned(key))?;
        blobs.insert(key.to_string(), value.as_bytes().to_vec());
        Ok(())
    }
}

fn poisoned(key: &str) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "storage lock poisoned"),
    }
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct DirDriver {
    dir: PathBuf,
}

impl DirDriver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageDriver for DirDriver {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Write then rename so a crash never leaves a half-written blob
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;
        debug!(path = %path.display(), bytes = value.len(), "Blob written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let driver = MemoryDriver::new();
        assert!(driver.read("k").unwrap().is_none());
        driver.write("k", "[]").unwrap();
        assert_eq!(driver.read("k").unwrap().as_deref(), Some(&b"[]"[..]));
    }

    #[test]
    fn test_dir_driver_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = DirDriver::new(tmp.path().join("nested"));
        assert!(driver.read("signsmart_docs").unwrap().is_none());

        driver.write("signsmart_docs", "[1]").unwrap();
        assert!(tmp.path().join("nested/signsmart_docs.json").exists());
        assert_eq!(
            driver.read("signsmart_docs").unwrap().as_deref(),
            Some(&b"[1]"[..])
        );
    }

    #[test]
    fn test_dir_driver_returns_non_utf8_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("signsmart_docs.json"), [0xff, 0xfe, b'[', b']']).unwrap();

        let driver = DirDriver::new(tmp.path());
        assert_eq!(
            driver.read("signsmart_docs").unwrap(),
            Some(vec![0xff, 0xfe, b'[', b']'])
        );
    }
}
