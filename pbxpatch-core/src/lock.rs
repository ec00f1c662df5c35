//! Exclusive advisory lock beside the descriptor.

use crate::error::PatchError;
use crate::ports::DescriptorStore;
use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use tracing::{debug, warn};

pub const LOCK_SUFFIX: &str = ".lock";

pub fn lock_path(descriptor: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{descriptor}{LOCK_SUFFIX}"))
}

/// Held for the duration of one run; the lock file is removed on drop.
pub struct PatchLock<'a> {
    store: &'a dyn DescriptorStore,
    path: Utf8PathBuf,
}

impl<'a> PatchLock<'a> {
    pub fn acquire(store: &'a dyn DescriptorStore, descriptor: &Utf8Path) -> Result<Self, PatchError> {
        let path = lock_path(descriptor);
        let owner = format!("pid {}\n", std::process::id());
        match store.create_new(&path, owner.as_bytes()) {
            Ok(()) => {
                debug!(lock = %path, "lock acquired");
                Ok(Self { store, path })
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                Err(PatchError::ConcurrentPatchInProgress { lock: path })
            }
            Err(err) => Err(PatchError::io(path, err)),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for PatchLock<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.store.remove(&self.path) {
            warn!(lock = %self.path, error = %err, "failed to remove lock file");
        } else {
            debug!(lock = %self.path, "lock released");
        }
    }
}
