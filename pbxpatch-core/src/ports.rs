//! Port trait abstracting all descriptor I/O away from the pipeline.

use camino::Utf8Path;
use std::io;

/// Byte storage for the descriptor, its backup and its lock file.
pub trait DescriptorStore {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>>;

    /// Replace the contents of `path`, creating it if needed.
    fn write(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()>;

    /// Create `path` only if it does not exist yet (`ErrorKind::AlreadyExists` otherwise).
    fn create_new(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()>;

    fn remove(&self, path: &Utf8Path) -> io::Result<()>;

    fn exists(&self, path: &Utf8Path) -> bool;
}
