//! Configuration file loading for pbxpatch.
//!
//! Discovers and loads `pbxpatch.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pbxpatch_core::DEFAULT_BACKUP_SUFFIX;
use pbxpatch_domain::ExtensionProfile;
use pbxpatch_render::OutputFormat;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "pbxpatch.toml";

/// Top-level configuration from pbxpatch.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PbxpatchConfig {
    /// `.xcodeproj` bundle name, relative to the project root. Discovered when unset.
    pub project: Option<String>,

    /// Backup settings.
    pub backups: BackupsConfig,

    /// Report output settings.
    pub output: OutputConfig,

    /// Host/extension object IDs and canonical values.
    pub profile: ExtensionProfile,

    /// Metadata merge settings.
    pub metadata: MetadataConfig,
}

/// Backups section of the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupsConfig {
    /// Suffix appended to the descriptor path for its backup.
    pub suffix: String,
}

impl Default for BackupsConfig {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Metadata section of the config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// File to merge into. Defaults to the profile's `info_plist`.
    pub file: Option<String>,

    /// Merged over the built-in share-extension overrides.
    pub overrides: toml::Table,
}

/// Discover the pbxpatch.toml config file.
///
/// Returns `None` if no config file is found in the project root.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a pbxpatch.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<PbxpatchConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<PbxpatchConfig> {
    let config: PbxpatchConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<PbxpatchConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(PbxpatchConfig::default()),
    }
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub project: Option<String>,
    pub dry_run: bool,
    pub backup_suffix: String,
    pub format: OutputFormat,
    pub profile: ExtensionProfile,

    /// Metadata file relative to the project root.
    pub metadata_file: String,
    pub metadata_overrides: serde_json::Value,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: PbxpatchConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: PbxpatchConfig) -> Self {
        Self { config }
    }

    /// Merge with CLI arguments. The profile is validated here so a bad `[profile]` table is
    /// reported before any file is touched.
    pub fn merge_cli_args(self, cli_dry_run: bool) -> anyhow::Result<MergedConfig> {
        let PbxpatchConfig {
            project,
            backups,
            output,
            profile,
            metadata,
        } = self.config;

        profile
            .validate()
            .context("invalid [profile] in pbxpatch.toml")?;
        let metadata_overrides = serde_json::to_value(&metadata.overrides)
            .context("convert [metadata.overrides]")?;
        let metadata_file = metadata
            .file
            .unwrap_or_else(|| profile.info_plist.clone());

        Ok(MergedConfig {
            project,
            dry_run: cli_dry_run,
            backup_suffix: backups.suffix,
            format: output.format,
            profile,
            metadata_file,
            metadata_overrides,
        })
    }
}
