mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use config::{ConfigMerger, MergedConfig};
use pbxpatch_core::adapters::FsDescriptorStore;
use pbxpatch_core::preflight::{self, PreflightError};
use pbxpatch_core::{
    EXIT_SUCCESS, EXIT_VALIDATION, Orchestrator, PatchSettings, Rule, SnapshotManager,
    builtin_rules,
};
use pbxpatch_domain::share_extension_overrides;
use pbxpatch_metadata::{MetadataDocument, check_app_group, merge, merge_file};
use pbxpatch_render::{FailureInfo, render, render_failure};
use pbxpatch_types::ToolInfo;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pbxpatch")]
#[command(about = "Embed an app extension in its host Xcode project, idempotently and with rollback", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,

    #[command(flatten)]
    patch: PatchArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check the project layout and required extension sources without patching.
    Validate(RootArgs),

    /// Merge the share-extension override set into the extension's Info.plist.
    MergeMetadata(RootArgs),

    /// Report whether the host entitlements carry the shared app group.
    CheckEntitlements(RootArgs),

    /// Remove the backup kept by the last successful run.
    Cleanup(RootArgs),

    /// List the patch rules in the order they run.
    ListRules,
}

#[derive(Debug, Args)]
struct PatchArgs {
    /// Directory holding the .xcodeproj bundle.
    #[arg(default_value = ".")]
    project_root: Utf8PathBuf,

    /// Run every rule and print the resulting diff without writing anything.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct RootArgs {
    /// Directory holding the .xcodeproj bundle.
    #[arg(default_value = ".")]
    project_root: Utf8PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.cmd {
        None => cmd_patch(cli.patch),
        Some(Command::Validate(args)) => cmd_validate(args),
        Some(Command::MergeMetadata(args)) => cmd_merge_metadata(args),
        Some(Command::CheckEntitlements(args)) => cmd_check_entitlements(args),
        Some(Command::Cleanup(args)) => cmd_cleanup(args),
        Some(Command::ListRules) => cmd_list_rules(),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

/// Errors that reach `main` are validation failures unless a patch error says otherwise.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<pbxpatch_core::PatchError>() {
        Some(patch) => patch.exit_code(),
        None => EXIT_VALIDATION,
    }
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "pbxpatch".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}

fn load_merged(root: &Utf8Path, dry_run: bool) -> anyhow::Result<MergedConfig> {
    let file_config = config::load_or_default(root)?;
    ConfigMerger::new(file_config).merge_cli_args(dry_run)
}

fn cmd_patch(args: PatchArgs) -> anyhow::Result<u8> {
    let root = args.project_root;
    let merged = load_merged(&root, args.dry_run)?;
    let descriptor = preflight::discover_descriptor(&root, merged.project.as_deref())?;
    preflight::require_sources(&root, &merged.profile)?;

    let settings = PatchSettings {
        project_root: root,
        descriptor,
        dry_run: merged.dry_run,
        backup_suffix: merged.backup_suffix,
        profile: merged.profile,
    };
    debug!(descriptor = %settings.descriptor, dry_run = settings.dry_run, "starting patch run");

    let store = FsDescriptorStore;
    let mut orchestrator = Orchestrator::new(&store);
    match orchestrator.apply(&settings, tool_info()) {
        Ok(report) => {
            print!("{}", render(&report, merged.format).context("render report")?);
            Ok(EXIT_SUCCESS)
        }
        Err(failure) => {
            let code = failure.exit_code();
            error!(exit_code = code, "{}", failure.error);
            let message = failure.error.to_string();
            let info = FailureInfo {
                message: &message,
                rule: failure.error.rule(),
                exit_code: code,
            };
            print!(
                "{}",
                render_failure(&failure.report, &info, merged.format).context("render report")?
            );
            Ok(code)
        }
    }
}

fn cmd_validate(args: RootArgs) -> anyhow::Result<u8> {
    let root = args.project_root;
    let merged = load_merged(&root, false)?;
    let descriptor = preflight::discover_descriptor(&root, merged.project.as_deref())?;
    println!("descriptor: {descriptor}");

    match preflight::require_sources(&root, &merged.profile) {
        Ok(()) => {
            println!(
                "sources: {} required file(s) present",
                merged.profile.required_sources.len()
            );
            Ok(EXIT_SUCCESS)
        }
        Err(PreflightError::MissingSources { missing }) => {
            for path in &missing {
                println!("missing: {path}");
            }
            error!(count = missing.len(), "required source files missing");
            Ok(EXIT_VALIDATION)
        }
        Err(other) => Err(other.into()),
    }
}

fn cmd_merge_metadata(args: RootArgs) -> anyhow::Result<u8> {
    let root = args.project_root;
    let merged = load_merged(&root, false)?;
    let path = root.join(&merged.metadata_file);

    let overrides = merge(
        &share_extension_overrides(&merged.profile),
        &merged.metadata_overrides,
    );
    let changed =
        merge_file(&path, &overrides).with_context(|| format!("merge metadata into {path}"))?;
    let status = if changed { "updated" } else { "unchanged" };
    println!("{path}: {status}");
    Ok(EXIT_SUCCESS)
}

fn cmd_check_entitlements(args: RootArgs) -> anyhow::Result<u8> {
    let root = args.project_root;
    let merged = load_merged(&root, false)?;
    let path = root.join(&merged.profile.host_entitlements);

    let doc = MetadataDocument::load(&path).with_context(|| format!("read entitlements {path}"))?;
    let check = check_app_group(&doc.value, &merged.profile.app_group);
    if check.present {
        println!("app group {}: present in {path}", check.group);
    } else {
        println!("app group {}: missing from {path}", check.group);
        if !check.groups.is_empty() {
            println!("declared groups: {}", check.groups.join(", "));
        }
    }
    Ok(EXIT_SUCCESS)
}

fn cmd_cleanup(args: RootArgs) -> anyhow::Result<u8> {
    let root = args.project_root;
    let merged = load_merged(&root, false)?;
    let descriptor = preflight::discover_descriptor(&root, merged.project.as_deref())?;

    let store = FsDescriptorStore;
    let snapshots = SnapshotManager::new(&store, merged.backup_suffix);
    let backup = snapshots.backup_path(&descriptor);
    if snapshots.cleanup(&descriptor)? {
        println!("removed {backup}");
    } else {
        println!("no backup at {backup}");
    }
    Ok(EXIT_SUCCESS)
}

fn cmd_list_rules() -> anyhow::Result<u8> {
    let rules = builtin_rules();
    let width = rules.iter().map(|r| r.name().len()).max().unwrap_or(0);
    println!("{:<3} {:<width$}  DESCRIPTION", "#", "RULE");
    for (i, rule) in rules.iter().enumerate() {
        println!("{:<3} {:<width$}  {}", i + 1, rule.name(), rule.description());
    }
    Ok(EXIT_SUCCESS)
}
