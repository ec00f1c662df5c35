//! Clap-free settings for one patch run.

use crate::snapshot::DEFAULT_BACKUP_SUFFIX;
use camino::{Utf8Path, Utf8PathBuf};
use pbxpatch_domain::ExtensionProfile;

#[derive(Debug, Clone)]
pub struct PatchSettings {
    pub project_root: Utf8PathBuf,
    /// Path of `project.pbxproj`, usually `<root>/<name>.xcodeproj/project.pbxproj`.
    pub descriptor: Utf8PathBuf,

    pub dry_run: bool,

    // Backups
    pub backup_suffix: String,

    pub profile: ExtensionProfile,
}

impl PatchSettings {
    pub fn new(project_root: impl Into<Utf8PathBuf>, descriptor: impl Into<Utf8PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            descriptor: descriptor.into(),
            dry_run: false,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            profile: ExtensionProfile::default(),
        }
    }

    /// Descriptor path relative to the project root, for diffs and reports.
    pub fn descriptor_display(&self) -> &Utf8Path {
        self.descriptor
            .strip_prefix(&self.project_root)
            .unwrap_or(&self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_path_is_root_relative() {
        let settings = PatchSettings::new("/work/app", "/work/app/App.xcodeproj/project.pbxproj");
        assert_eq!(settings.descriptor_display(), "App.xcodeproj/project.pbxproj");
        assert_eq!(settings.backup_suffix, ".backup");
        assert!(!settings.dry_run);
    }

    #[test]
    fn display_path_falls_back_to_full_path() {
        let settings = PatchSettings::new("/elsewhere", "/work/app/App.xcodeproj/project.pbxproj");
        assert_eq!(
            settings.descriptor_display(),
            "/work/app/App.xcodeproj/project.pbxproj"
        );
    }
}
