//! Rendering helpers (text, markdown, JSON) for run reports.

use pbxpatch_types::{PatchReport, RuleStatus};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

/// What went wrong, for rendering alongside the partial report.
#[derive(Debug, Clone, Serialize)]
pub struct FailureInfo<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'a str>,
    pub exit_code: u8,
}

#[derive(Serialize)]
struct FailureEnvelope<'a> {
    report: &'a PatchReport,
    error: &'a FailureInfo<'a>,
}

pub fn render(report: &PatchReport, format: OutputFormat) -> serde_json::Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Markdown => render_md(report),
        OutputFormat::Json => render_json(report)?,
    })
}

pub fn render_failure(
    report: &PatchReport,
    failure: &FailureInfo<'_>,
    format: OutputFormat,
) -> serde_json::Result<String> {
    Ok(match format {
        OutputFormat::Text => {
            let mut out = render_text(report);
            let _ = writeln!(out, "error: {}", failure.message);
            if let Some(rule) = failure.rule {
                let _ = writeln!(out, "failed rule: {rule}");
            }
            let _ = writeln!(out, "exit code: {}", failure.exit_code);
            out
        }
        OutputFormat::Markdown => {
            let mut out = render_md(report);
            out.push_str("## Failure\n\n");
            let _ = writeln!(out, "- Error: {}", failure.message);
            if let Some(rule) = failure.rule {
                let _ = writeln!(out, "- Rule: `{rule}`");
            }
            let _ = writeln!(out, "- Exit code: `{}`", failure.exit_code);
            out
        }
        OutputFormat::Json => {
            let mut out = serde_json::to_string_pretty(&FailureEnvelope {
                report,
                error: failure,
            })?;
            out.push('\n');
            out
        }
    })
}

pub fn render_text(report: &PatchReport) -> String {
    let mut out = String::new();
    let mode = if report.dry_run { " (dry run)" } else { "" };
    let _ = writeln!(out, "pbxpatch: {}{mode}", report.descriptor);
    let _ = writeln!(out, "state: {}", report.state.as_str());

    let width = report.rules.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for r in &report.rules {
        let _ = writeln!(
            out,
            "  {:<width$}  {:<7}  {} -> {} bytes",
            r.name,
            status_label(r.status),
            r.bytes_before,
            r.bytes_after
        );
    }

    if let Some(backup) = &report.backup {
        let _ = writeln!(out, "backup: {backup}");
    }
    let changed = match (report.changed, report.dry_run) {
        (true, true) => "would change",
        (true, false) => "changed",
        (false, _) => "unchanged",
    };
    let _ = writeln!(out, "descriptor: {changed}");
    out
}

pub fn render_md(report: &PatchReport) -> String {
    let mut out = String::new();
    out.push_str("# pbxpatch report\n\n");
    let _ = writeln!(out, "- Descriptor: `{}`", report.descriptor);
    let _ = writeln!(out, "- State: `{}`", report.state.as_str());
    let _ = writeln!(out, "- Dry run: `{}`", report.dry_run);
    let _ = writeln!(out, "- Changed: `{}`", report.changed);
    if let Some(backup) = &report.backup {
        let _ = writeln!(out, "- Backup: `{backup}`");
    }
    if let (Some(before), Some(after)) = (&report.sha256_before, &report.sha256_after) {
        let _ = writeln!(out, "- SHA-256: `{before}` → `{after}`");
    }
    out.push('\n');

    out.push_str("## Rules\n\n");
    if report.rules.is_empty() {
        out.push_str("_No rules ran._\n\n");
    } else {
        out.push_str("| # | Rule | Status | Bytes |\n|---|------|--------|-------|\n");
        for (i, r) in report.rules.iter().enumerate() {
            let _ = writeln!(
                out,
                "| {} | `{}` | {} | {} → {} |",
                i + 1,
                r.name,
                status_label(r.status),
                r.bytes_before,
                r.bytes_after
            );
        }
        out.push('\n');
    }

    if !report.patch.is_empty() {
        out.push_str("## Patch\n\n```diff\n");
        out.push_str(&report.patch);
        if !report.patch.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n\n");
    }
    out
}

pub fn render_json(report: &PatchReport) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

fn status_label(s: RuleStatus) -> &'static str {
    match s {
        RuleStatus::Applied => "applied",
        RuleStatus::Noop => "noop",
    }
}
