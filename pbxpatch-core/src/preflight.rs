//! Checks that run before any lock or snapshot: locating the descriptor and confirming the
//! extension's source files exist. Failures here are validation failures (exit code 1).

use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pbxpatch_domain::ExtensionProfile;
use thiserror::Error;
use tracing::debug;

pub const DESCRIPTOR_FILE_NAME: &str = "project.pbxproj";
const PROJECT_EXTENSION: &str = "xcodeproj";

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("no .xcodeproj found in `{root}`")]
    NoProject { root: Utf8PathBuf },

    #[error("several .xcodeproj bundles in `{root}` ({}); set `project` in pbxpatch.toml", .found.join(", "))]
    AmbiguousProject {
        root: Utf8PathBuf,
        found: Vec<String>,
    },

    #[error("descriptor `{path}` does not exist")]
    MissingDescriptor { path: Utf8PathBuf },

    #[error("{} required source file(s) missing: {}", .missing.len(), .missing.join(", "))]
    MissingSources { missing: Vec<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Resolve `<root>/<project>/project.pbxproj`. With no configured project, exactly one
/// `.xcodeproj` directory must exist in the root.
pub fn discover_descriptor(
    root: &Utf8Path,
    configured: Option<&str>,
) -> Result<Utf8PathBuf, PreflightError> {
    let project = match configured {
        Some(name) => root.join(name),
        None => {
            let mut found = Vec::new();
            for entry in fs::read_dir(root)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type()?.is_dir()
                    && Utf8Path::new(&name).extension() == Some(PROJECT_EXTENSION)
                {
                    found.push(name);
                }
            }
            found.sort();
            match found.len() {
                0 => {
                    return Err(PreflightError::NoProject {
                        root: root.to_path_buf(),
                    });
                }
                1 => root.join(&found[0]),
                _ => {
                    return Err(PreflightError::AmbiguousProject {
                        root: root.to_path_buf(),
                        found,
                    });
                }
            }
        }
    };
    let descriptor = project.join(DESCRIPTOR_FILE_NAME);
    if !descriptor.is_file() {
        return Err(PreflightError::MissingDescriptor { path: descriptor });
    }
    debug!(descriptor = %descriptor, "descriptor located");
    Ok(descriptor)
}

/// Required source files (relative to `root`) that do not exist.
pub fn missing_sources(root: &Utf8Path, profile: &ExtensionProfile) -> Vec<String> {
    profile
        .required_sources
        .iter()
        .filter(|rel| !root.join(rel.as_str()).is_file())
        .cloned()
        .collect()
}

pub fn require_sources(root: &Utf8Path, profile: &ExtensionProfile) -> Result<(), PreflightError> {
    let missing = missing_sources(root, profile);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PreflightError::MissingSources { missing })
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

    fn make_project(root: &Utf8Path, name: &str) {
        std::fs::create_dir_all(root.join(name)).expect("mkdir");
        std::fs::write(root.join(name).join(DESCRIPTOR_FILE_NAME), "{}").expect("write");
    }

    #[test]
    fn discovers_single_project() {
        let (_temp, root) = temp_root();
        make_project(&root, "App.xcodeproj");
        std::fs::create_dir_all(root.join("Sources")).expect("mkdir");

        let descriptor = discover_descriptor(&root, None).expect("discover");
        assert_eq!(descriptor, root.join("App.xcodeproj/project.pbxproj"));
    }

    #[test]
    fn several_projects_need_configuration() {
        let (_temp, root) = temp_root();
        make_project(&root, "B.xcodeproj");
        make_project(&root, "A.xcodeproj");

        match discover_descriptor(&root, None) {
            Err(PreflightError::AmbiguousProject { found, .. }) => {
                assert_eq!(found, vec!["A.xcodeproj", "B.xcodeproj"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        let descriptor = discover_descriptor(&root, Some("B.xcodeproj")).expect("configured");
        assert!(descriptor.as_str().ends_with("B.xcodeproj/project.pbxproj"));
    }

    #[test]
    fn empty_root_has_no_project() {
        let (_temp, root) = temp_root();
        assert!(matches!(
            discover_descriptor(&root, None),
            Err(PreflightError::NoProject { .. })
        ));
        assert!(matches!(
            discover_descriptor(&root, Some("Gone.xcodeproj")),
            Err(PreflightError::MissingDescriptor { .. })
        ));
    }

    #[test]
    fn reports_missing_sources_in_profile_order() {
        let (_temp, root) = temp_root();
        let profile = ExtensionProfile {
            required_sources: vec!["a.swift".into(), "dir/b.plist".into(), "c.swift".into()],
            ..ExtensionProfile::default()
        };
        std::fs::write(root.join("a.swift"), "").expect("write");

        assert_eq!(missing_sources(&root, &profile), vec!["dir/b.plist", "c.swift"]);
        let err = require_sources(&root, &profile).unwrap_err();
        assert!(err.to_string().contains("2 required source file(s) missing"));
    }
}
