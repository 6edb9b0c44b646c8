//! Plain-text rendering for ws command output.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Serialize;

use ws_core::adapters::{AdapterListing, Category};
use ws_core::config::WsConfig;
use ws_core::listing::{staleness, Staleness};
use ws_core::preset::PresetInfo;
use ws_core::setup::{CheckState, SetupReport};
use ws_core::step::{Report, StepStatus};
use ws_core::workspace::{Status, WorkspaceEntry, WorkspaceMeta, WorkspaceNode};

pub const EMPTY_LIST: &str = "No workspaces found.";

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

pub fn status_icon(status: Option<Status>) -> char {
    match status {
        Some(Status::Active) => '●',
        Some(Status::Paused) => '◐',
        Some(Status::Archived) => '○',
        Some(Status::Abandoned) => '✗',
        None => '?',
    }
}

pub fn stale_suffix(meta: &WorkspaceMeta, today: NaiveDate) -> String {
    match staleness(meta, today) {
        Staleness::Fresh => String::new(),
        Staleness::Idle(days) => format!(" ({days}d)"),
        Staleness::Stale(days) => format!(" ({days}d stale)"),
    }
}

/// Fixed-width table of name, status, last opened and tags.
pub fn render_list(entries: &[WorkspaceEntry]) -> String {
    if entries.is_empty() {
        return format!("{EMPTY_LIST}\n");
    }
    let name_width = entries
        .iter()
        .map(|entry| entry.name.to_string().chars().count())
        .max()
        .unwrap_or(0)
        .max(20)
        + 2;

    let mut out = String::new();
    let header = format!(
        "{:<name_width$}{:<12}{:<14}{}",
        "NAME", "STATUS", "LAST OPENED", "TAGS"
    );
    let _ = writeln!(out, "{header}");
    let _ = writeln!(out, "{}", "-".repeat(header.chars().count() + 10));

    for entry in entries {
        let (status, last_opened, tags) = match entry.meta.as_ref() {
            Some(meta) => (
                meta.status.to_string(),
                meta.last_opened.to_string(),
                meta.tags.join(", "),
            ),
            None => ("unknown".to_string(), "-".to_string(), String::new()),
        };
        let line = format!(
            "{:<name_width$}{:<12}{:<14}{}",
            entry.name.to_string(),
            status,
            last_opened,
            tags
        );
        let _ = writeln!(out, "{}", line.trim_end());
    }
    let _ = write!(out, "\n{} workspace(s)\n", entries.len());
    out
}

/// Box-drawn hierarchy with status icons, tags and staleness hints.
/// Grouping directories that are not workspaces carry no icon.
pub fn render_tree(tree: &WorkspaceNode, root_label: &str, today: NaiveDate) -> String {
    if tree.children.is_empty() {
        return format!("{EMPTY_LIST}\n");
    }
    let mut out = String::new();
    let _ = writeln!(out, "Workspaces ({root_label})\n");
    let count = tree.children.len();
    for (index, child) in tree.children.iter().enumerate() {
        render_node(&mut out, child, "", index + 1 == count, today);
    }
    out
}

fn render_node(out: &mut String, node: &WorkspaceNode, prefix: &str, last: bool, today: NaiveDate) {
    let connector = if last { "└── " } else { "├── " };
    let mut line = format!("{prefix}{connector}");
    if node.is_workspace {
        line.push(status_icon(node.meta.as_ref().map(|meta| meta.status)));
        line.push(' ');
    }
    line.push_str(&node.name);
    if let Some(meta) = node.meta.as_ref() {
        if !meta.tags.is_empty() {
            let _ = write!(line, " [{}]", meta.tags.join(", "));
        }
        line.push_str(&stale_suffix(meta, today));
    }
    let _ = writeln!(out, "{line}");

    let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
    let count = node.children.len();
    for (index, child) in node.children.iter().enumerate() {
        render_node(out, child, &child_prefix, index + 1 == count, today);
    }
}

/// One indented line per step, headed by `title`.
pub fn render_report(title: &str, report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}: {}", report.workspace);
    for step in &report.steps {
        let text = match (&step.status, step.detail.as_deref()) {
            (StepStatus::Ok, Some(detail)) => detail.to_string(),
            (StepStatus::Ok, None) => "ok".to_string(),
            (StepStatus::Warning(reason), _) => format!("warning: {reason}"),
            (StepStatus::Skipped(reason), _) => format!("skipped ({reason})"),
            (StepStatus::Failed(reason), _) => format!("failed ({reason})"),
        };
        let _ = writeln!(out, "  {}: {text}", step.label);
    }
    out
}

/// Registered adapters per category, with the configured one starred.
pub fn render_adapters(
    listing: &BTreeMap<Category, Vec<AdapterListing>>,
    config: &WsConfig,
) -> String {
    let mut out = String::new();
    for (category, adapters) in listing {
        let active = config.adapters.get(*category);
        let _ = writeln!(out, "{category}:");
        for adapter in adapters {
            let marker = if active == Some(adapter.name.as_str()) { '*' } else { ' ' };
            let _ = writeln!(out, "  {marker} {:<14}{}", adapter.name, adapter.description);
        }
    }
    out
}

pub fn render_presets(presets: &[PresetInfo], active: Option<&str>) -> String {
    let mut out = String::new();
    for preset in presets {
        let marker = if active == Some(preset.name.as_str()) { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {:<16}{:<10}{}",
            preset.name,
            preset.source.as_str(),
            preset.description
        );
    }
    out
}

pub fn render_setup(report: &SetupReport, dry_run: bool) -> String {
    let mut out = String::new();
    let root = report.root.display();
    if report.root_existed {
        let _ = writeln!(out, "Workspaces root exists: {root}");
    } else if report.root_created {
        let _ = writeln!(out, "Created workspaces root: {root}");
    } else {
        let _ = writeln!(out, "Would create workspaces root: {root}");
    }

    let _ = writeln!(out, "\nAdapters:");
    let mut hints = Vec::new();
    for check in &report.adapters {
        let adapter = check.adapter.as_deref().unwrap_or_default();
        let status = match &check.state {
            CheckState::NotConfigured => "(none configured)".to_string(),
            CheckState::Installed => format!("{adapter} ✓"),
            CheckState::Missing { install_hint } => {
                hints.push(install_hint.clone());
                format!("{adapter} ✗ (not installed)")
            }
            CheckState::Unknown { error } => format!("⚠ {error}"),
        };
        let _ = writeln!(out, "  {}: {status}", check.category);
    }

    let _ = writeln!(out, "\nOptional tools:");
    for tool in &report.optional {
        let mark = if tool.installed { '✓' } else { '✗' };
        let _ = writeln!(out, "  {}: {mark} ({})", tool.tool, tool.description);
        if !tool.installed {
            hints.push(tool.install_hint.clone());
        }
    }

    if hints.is_empty() {
        let _ = writeln!(out, "\nAll dependencies installed!");
    } else {
        let heading = if dry_run { "Would install" } else { "To install" };
        let _ = writeln!(out, "\n{heading}:");
        for hint in hints {
            let _ = writeln!(out, "  {hint}");
        }
    }
    out
}
