//! I/O boundary traits for testability
//!
//! These traits abstract the backing blob store, allowing the tree store
//! to be tested with in-memory implementations.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

/// Opaque key-value blob storage: the best-effort durable mirror of the
/// canonical tree and the single-slot edit cache.
pub trait BlobStore {
    /// Overwrite the blob stored under `key`.
    fn put(&mut self, key: &str, bytes: &[u8]) -> io::Result<()>;

    /// Read the blob stored under `key`, None when absent.
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
}

/// Shared handles count as stores too, so tests can keep a second handle on
/// the blobs a `TreeStore` writes through.
impl<B: BlobStore> BlobStore for Rc<RefCell<B>> {
    fn put(&mut self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.borrow_mut().put(key, bytes)
    }

    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        self.borrow().get(key)
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&mut self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }
}

/// Blob store backed by a directory, one file per key.
#[derive(Debug)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl BlobStore for FileBlobStore {
    fn put(&mut self, key: &str, bytes: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), bytes)
    }

    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_overwrites_on_put() {
        let mut store = MemoryBlobStore::new();
        store.put("slot", b"first").unwrap();
        store.put("slot", b"second").unwrap();
        assert_eq!(store.get("slot").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_memory_store_missing_key_is_none() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.get("absent").unwrap(), None);
    }

    #[test]
    fn test_file_store_round_trips_blobs() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = FileBlobStore::new(dir.path());
        assert_eq!(store.get("tree").unwrap(), None);
        store.put("tree", b"[]").unwrap();
        assert_eq!(store.get("tree").unwrap(), Some(b"[]".to_vec()));
    }
}
