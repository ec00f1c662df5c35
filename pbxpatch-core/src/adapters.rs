//! Default filesystem-backed port implementation, plus an in-memory one for embedding and
//! tests.

use crate::ports::DescriptorStore;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

#[derive(Debug, Clone, Default)]
pub struct FsDescriptorStore;

impl DescriptorStore for FsDescriptorStore {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn create_new(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(contents)
    }

    fn remove(&self, path: &Utf8Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        path.exists()
    }
}

/// In-memory store with write-fault injection.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    files: RefCell<BTreeMap<Utf8PathBuf, Vec<u8>>>,
    failing_writes: RefCell<BTreeSet<Utf8PathBuf>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<Utf8PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.borrow_mut().insert(path.into(), contents.into());
        self
    }

    pub fn get(&self, path: &Utf8Path) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    /// Make the next write to `path` fail. Later writes succeed again.
    pub fn fail_next_write(&self, path: impl Into<Utf8PathBuf>) {
        self.failing_writes.borrow_mut().insert(path.into());
    }

    /// Remove `path` directly, bypassing the port.
    pub fn delete(&self, path: &Utf8Path) {
        self.files.borrow_mut().remove(path);
    }

    fn take_injected_failure(&self, path: &Utf8Path) -> io::Result<()> {
        if self.failing_writes.borrow_mut().remove(path) {
            return Err(io::Error::other(format!("injected write failure for {path}")));
        }
        Ok(())
    }
}

impl DescriptorStore for InMemoryStore {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
    }

    fn write(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
        self.take_injected_failure(path)?;
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_new(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
        self.take_injected_failure(path)?;
        let mut files = self.files.borrow_mut();
        if files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{path} already exists"),
            ));
        }
        files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn remove(&self, path: &Utf8Path) -> io::Result<()> {
        self.files
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not found")))
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        self.files.borrow().contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        (temp, root)
    }

    #[test]
    fn fs_store_create_new_refuses_existing_file() {
        let (_temp, root) = temp_root();
        let path = root.join("x.lock");
        let store = FsDescriptorStore;

        store.create_new(&path, b"1").expect("first create");
        let err = store.create_new(&path, b"2").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(store.read(&path).expect("read"), b"1");

        store.remove(&path).expect("remove");
        assert!(!store.exists(&path));
    }

    #[test]
    fn fs_store_errors_name_the_path() {
        let (_temp, root) = temp_root();
        let path = root.join("missing.pbxproj");
        let err = FsDescriptorStore.read(&path).unwrap_err();
        assert!(err.to_string().contains("missing.pbxproj"));
    }

    #[test]
    fn in_memory_injected_failure_fires_once() {
        let store = InMemoryStore::new().with_file("a", "old");
        store.fail_next_write("a");
        assert!(store.write(Utf8Path::new("a"), b"new").is_err());
        assert_eq!(store.get(Utf8Path::new("a")).unwrap(), b"old");
        store.write(Utf8Path::new("a"), b"new").expect("second write");
        assert_eq!(store.get(Utf8Path::new("a")).unwrap(), b"new");
    }

    #[test]
    fn in_memory_create_new_and_remove() {
        let store = InMemoryStore::new();
        let lock = Utf8Path::new("p.lock");
        store.create_new(lock, b"").expect("create");
        assert_eq!(
            store.create_new(lock, b"").unwrap_err().kind(),
            io::ErrorKind::AlreadyExists
        );
        store.remove(lock).expect("remove");
        assert_eq!(
            store.remove(lock).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
