//! Byte-exact capture and restore of the descriptor around one run.
//!
//! `begin` persists `<descriptor><suffix>` before anything is mutated. The backup outlives a
//! successful run as an audit trail and is only removed by [`SnapshotManager::cleanup`].

use crate::error::{PatchError, RollbackError};
use crate::ports::DescriptorStore;
use camino::{Utf8Path, Utf8PathBuf};
use pbxpatch_edit::sha256_hex;
use tracing::{debug, info, warn};

pub const DEFAULT_BACKUP_SUFFIX: &str = ".backup";

/// Immutable copy of the descriptor as it was before the run.
#[derive(Debug, Clone)]
pub struct Snapshot {
    descriptor: Utf8PathBuf,
    backup: Option<Utf8PathBuf>,
    bytes: Vec<u8>,
    sha256: String,
}

impl Snapshot {
    pub fn descriptor(&self) -> &Utf8Path {
        &self.descriptor
    }

    /// Where the backup was written; `None` for read-only captures.
    pub fn backup(&self) -> Option<&Utf8Path> {
        self.backup.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn text(&self) -> Result<&str, PatchError> {
        std::str::from_utf8(&self.bytes).map_err(|e| {
            PatchError::io(
                &self.descriptor,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }
}

pub struct SnapshotManager<'a> {
    store: &'a dyn DescriptorStore,
    backup_suffix: String,
}

impl<'a> SnapshotManager<'a> {
    pub fn new(store: &'a dyn DescriptorStore, backup_suffix: impl Into<String>) -> Self {
        Self {
            store,
            backup_suffix: backup_suffix.into(),
        }
    }

    pub fn backup_path(&self, descriptor: &Utf8Path) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{descriptor}{}", self.backup_suffix))
    }

    /// Read the descriptor and persist its backup.
    pub fn begin(&self, descriptor: &Utf8Path) -> Result<Snapshot, PatchError> {
        let mut snapshot = self.capture(descriptor)?;
        let backup = self.backup_path(descriptor);
        self.store
            .write(&backup, &snapshot.bytes)
            .map_err(|e| PatchError::io(&backup, e))?;
        debug!(backup = %backup, sha256 = %snapshot.sha256, "backup written");
        snapshot.backup = Some(backup);
        Ok(snapshot)
    }

    /// Read the descriptor without writing a backup (dry runs).
    pub fn capture(&self, descriptor: &Utf8Path) -> Result<Snapshot, PatchError> {
        let bytes = self
            .store
            .read(descriptor)
            .map_err(|e| PatchError::io(descriptor, e))?;
        let sha256 = sha256_hex(&bytes);
        Ok(Snapshot {
            descriptor: descriptor.to_path_buf(),
            backup: None,
            bytes,
            sha256,
        })
    }

    /// Mark the run successful. The backup stays in place.
    pub fn commit(&self, snapshot: Snapshot) {
        debug!(
            descriptor = %snapshot.descriptor,
            backup = ?snapshot.backup,
            "snapshot committed"
        );
    }

    /// Overwrite the descriptor with the backup content.
    pub fn restore(&self, snapshot: &Snapshot) -> Result<(), RollbackError> {
        let backup = snapshot
            .backup
            .clone()
            .unwrap_or_else(|| self.backup_path(&snapshot.descriptor));
        if !self.store.exists(&backup) {
            return Err(RollbackError::BackupMissing { path: backup });
        }
        let bytes = self.store.read(&backup).map_err(|source| RollbackError::Io {
            path: backup.clone(),
            source,
        })?;
        let actual = sha256_hex(&bytes);
        if actual != snapshot.sha256 {
            return Err(RollbackError::BackupMismatch {
                path: backup,
                expected: snapshot.sha256.clone(),
                actual,
            });
        }
        self.store
            .write(&snapshot.descriptor, &bytes)
            .map_err(|source| RollbackError::Io {
                path: snapshot.descriptor.clone(),
                source,
            })?;
        warn!(descriptor = %snapshot.descriptor, backup = %backup, "descriptor restored from backup");
        Ok(())
    }

    /// Remove the backup left by earlier runs. Returns whether one existed.
    pub fn cleanup(&self, descriptor: &Utf8Path) -> Result<bool, PatchError> {
        let backup = self.backup_path(descriptor);
        if !self.store.exists(&backup) {
            return Ok(false);
        }
        self.store
            .remove(&backup)
            .map_err(|e| PatchError::io(&backup, e))?;
        info!(backup = %backup, "backup removed");
        Ok(true)
    }
}
