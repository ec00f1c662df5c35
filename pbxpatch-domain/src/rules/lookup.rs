//! Graph lookups shared by several rules.

use crate::profile::ExtensionProfile;
use pbxpatch_edit::MatchError;
use pbxpatch_edit::error::{MatchResult, at_most_one};
use pbxpatch_edit::lists::{ListEntry, parse_list};
use pbxpatch_edit::matchers::{self, ObjectSpan};

pub const NATIVE_TARGET: &str = "PBXNativeTarget";
pub const TARGET_DEPENDENCY: &str = "PBXTargetDependency";
pub const CONTAINER_ITEM_PROXY: &str = "PBXContainerItemProxy";
pub const COPY_FILES_PHASE: &str = "PBXCopyFilesBuildPhase";
pub const BUILD_FILE: &str = "PBXBuildFile";
pub const RESOURCES_PHASE: &str = "PBXResourcesBuildPhase";
pub const SYNC_ROOT_GROUP: &str = "PBXFileSystemSynchronizedRootGroup";
pub const SYNC_EXCEPTION_SET: &str = "PBXFileSystemSynchronizedBuildFileExceptionSet";
pub const BUILD_CONFIGURATION: &str = "XCBuildConfiguration";

/// Destination code for plug-ins and app extensions.
pub const DST_SUBFOLDER_PLUGINS: &str = "13";

/// Locate `id` and require its `isa` to be `kind`.
pub fn require_kind(text: &str, id: &str, kind: &str) -> MatchResult<ObjectSpan> {
    let obj = matchers::require_object(text, id)?;
    let isa = matchers::isa(text, &obj)?;
    if isa != kind {
        return Err(MatchError::not_found_at(format!("{kind} {id} (found {isa})"), obj.open));
    }
    Ok(obj)
}

pub fn require_target(text: &str, id: &str) -> MatchResult<ObjectSpan> {
    require_kind(text, id, NATIVE_TARGET)
}

/// Unquoted scalar property, `None` when absent.
pub fn scalar(text: &str, obj: &ObjectSpan, key: &str) -> MatchResult<Option<String>> {
    Ok(matchers::find_property(text, obj, key)?.map(|p| p.scalar(text)))
}

/// Display name of an object: its `name`, else its `path`, else its ID.
pub fn display_name(text: &str, obj: &ObjectSpan) -> MatchResult<String> {
    if let Some(name) = scalar(text, obj, "name")? {
        return Ok(name);
    }
    if let Some(path) = scalar(text, obj, "path")? {
        return Ok(path);
    }
    Ok(obj.id.clone())
}

/// Entries of a list property; empty when the property is absent.
pub fn list_entries(text: &str, obj: &ObjectSpan, key: &str) -> MatchResult<Vec<ListEntry>> {
    match matchers::find_property(text, obj, key)? {
        Some(prop) => parse_list(text, &prop),
        None => Ok(Vec::new()),
    }
}

/// Objects referenced from a list property whose `isa` is `kind`.
pub fn referenced_of_kind(
    text: &str,
    obj: &ObjectSpan,
    key: &str,
    kind: &str,
) -> MatchResult<Vec<ObjectSpan>> {
    let mut out = Vec::new();
    for entry in list_entries(text, obj, key)? {
        let Some(target) = matchers::find_object(text, &entry.value)? else {
            continue;
        };
        if matchers::isa(text, &target)? == kind {
            out.push(target);
        }
    }
    Ok(out)
}

/// Every target dependency that points at `target_id`, directly or through its proxy.
pub fn dependencies_on(text: &str, target_id: &str) -> MatchResult<Vec<ObjectSpan>> {
    let mut out = Vec::new();
    for dep in matchers::objects_in_section(text, TARGET_DEPENDENCY)? {
        if scalar(text, &dep, "target")?.as_deref() == Some(target_id) {
            out.push(dep);
            continue;
        }
        let Some(proxy_id) = scalar(text, &dep, "targetProxy")? else {
            continue;
        };
        let Some(proxy) = matchers::find_object(text, &proxy_id)? else {
            continue;
        };
        if scalar(text, &proxy, "remoteGlobalIDString")?.as_deref() == Some(target_id) {
            out.push(dep);
        }
    }
    Ok(out)
}

/// The host's dependency on the extension, as listed in the host's `dependencies`.
pub fn find_dependency_edge(text: &str, profile: &ExtensionProfile) -> MatchResult<Option<ObjectSpan>> {
    let host = require_target(text, &profile.host_target)?;
    let listed = list_entries(text, &host, "dependencies")?;
    let found: Vec<ObjectSpan> = dependencies_on(text, &profile.extension_target)?
        .into_iter()
        .filter(|dep| listed.iter().any(|e| e.value == dep.id))
        .collect();
    at_most_one(
        format!("{TARGET_DEPENDENCY} on {}", profile.extension_target),
        found,
        |d| d.line_start,
    )
}

pub fn require_dependency_edge(text: &str, profile: &ExtensionProfile) -> MatchResult<ObjectSpan> {
    find_dependency_edge(text, profile)?.ok_or_else(|| {
        MatchError::not_found(format!(
            "{TARGET_DEPENDENCY} on {} in {}.dependencies",
            profile.extension_target, profile.host_target
        ))
    })
}

/// The host's copy-files phase that embeds extensions.
pub fn find_embed_phase(text: &str, host: &ObjectSpan) -> MatchResult<Option<ObjectSpan>> {
    let mut found = Vec::new();
    for phase in referenced_of_kind(text, host, "buildPhases", COPY_FILES_PHASE)? {
        if scalar(text, &phase, "dstSubfolderSpec")?.as_deref() == Some(DST_SUBFOLDER_PLUGINS) {
            found.push(phase);
        }
    }
    at_most_one(
        format!("{COPY_FILES_PHASE} with dstSubfolderSpec = {DST_SUBFOLDER_PLUGINS} in {}", host.id),
        found,
        |p| p.line_start,
    )
}

/// True when nothing but the object's own definition mentions its ID.
pub fn is_unreferenced(text: &str, obj: &ObjectSpan) -> bool {
    matchers::reference_count(text, &obj.id) == 1
}

/// The one dependency on `target_id` that no target lists, if any.
pub fn unlisted_dependency_on(text: &str, target_id: &str) -> MatchResult<Option<ObjectSpan>> {
    let unlisted = dependencies_on(text, target_id)?
        .into_iter()
        .filter(|dep| is_unreferenced(text, dep))
        .collect();
    at_most_one(
        format!("unlisted {TARGET_DEPENDENCY} on {target_id}"),
        unlisted,
        |d| d.line_start,
    )
}

/// The one plug-ins copy phase that no target lists, if any.
pub fn unlisted_embed_phase(text: &str) -> MatchResult<Option<ObjectSpan>> {
    let mut found = Vec::new();
    for phase in matchers::objects_in_section(text, COPY_FILES_PHASE)? {
        if scalar(text, &phase, "dstSubfolderSpec")?.as_deref() == Some(DST_SUBFOLDER_PLUGINS)
            && is_unreferenced(text, &phase)
        {
            found.push(phase);
        }
    }
    at_most_one(
        format!("unlisted {COPY_FILES_PHASE} with dstSubfolderSpec = {DST_SUBFOLDER_PLUGINS}"),
        found,
        |p| p.line_start,
    )
}

/// The one build file for `file_ref` that no phase lists, if any.
pub fn unlisted_build_file(text: &str, file_ref: &str) -> MatchResult<Option<ObjectSpan>> {
    let mut found = Vec::new();
    for build_file in matchers::objects_in_section(text, BUILD_FILE)? {
        if scalar(text, &build_file, "fileRef")?.as_deref() == Some(file_ref)
            && is_unreferenced(text, &build_file)
        {
            found.push(build_file);
        }
    }
    at_most_one(
        format!("unlisted {BUILD_FILE} for {file_ref}"),
        found,
        |b| b.line_start,
    )
}
