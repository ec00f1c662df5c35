use crate::error::MetadataResult;
use crate::format::{self, MetadataFormat};
use crate::merge::merge_in_place;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde_json::Value;
use tracing::{debug, info};

/// A metadata file loaded into memory, remembering the encoding it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDocument {
    pub path: Utf8PathBuf,
    pub format: MetadataFormat,
    pub value: Value,
}

impl MetadataDocument {
    pub fn load(path: &Utf8Path) -> MetadataResult<Self> {
        let bytes = fs::read(path)?;
        let format = MetadataFormat::from_path(path)?.refine(&bytes);
        let value = format::parse(&bytes, format)?;
        debug!(path = %path, format = %format, "loaded metadata");
        Ok(Self {
            path: path.to_path_buf(),
            format,
            value,
        })
    }

    /// Write the document back in the format it was loaded from.
    pub fn save(&self) -> MetadataResult<()> {
        let bytes = format::render(&self.value, self.format)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// Merge `overrides` into the document. Returns whether anything changed.
    pub fn apply_overrides(&mut self, overrides: &Value) -> bool {
        let before = self.value.clone();
        merge_in_place(&mut self.value, overrides);
        self.value != before
    }
}

/// Load `path`, merge `overrides`, and write it back only when the merge changed it.
pub fn merge_file(path: &Utf8Path, overrides: &Value) -> MetadataResult<bool> {
    let mut doc = MetadataDocument::load(path)?;
    let changed = doc.apply_overrides(overrides);
    if changed {
        doc.save()?;
        info!(path = %path, format = %doc.format, "metadata updated");
    } else {
        debug!(path = %path, "metadata already up to date");
    }
    Ok(changed)
}
