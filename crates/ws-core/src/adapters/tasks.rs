use std::path::Path;

use tracing::debug;

use super::{checked, AdapterInfo, AdapterResult, TasksAdapter, TasksInit};
use crate::exec::{self, RunOptions};

/// Git-backed issue tracker (`bd`), one database per workspace under `.beads`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Beads;

const BEADS: &str = "bd";
const BEADS_DIR: &str = ".beads";

impl AdapterInfo for Beads {
    fn name(&self) -> &str {
        "beads"
    }

    fn description(&self) -> &str {
        "Git-backed issue tracker for coding agents"
    }

    fn binary(&self) -> &str {
        BEADS
    }

    fn install_hint(&self) -> &str {
        "see https://github.com/steveyegge/beads"
    }
}

impl TasksAdapter for Beads {
    fn is_initialized(&self, workspace: &Path) -> bool {
        workspace.join(BEADS_DIR).is_dir()
    }

    fn init(&self, workspace: &Path) -> AdapterResult<TasksInit> {
        if self.is_initialized(workspace) {
            return Ok(TasksInit::AlreadyInitialized);
        }
        let output = exec::run(BEADS, ["init"], &RunOptions::in_dir(workspace));
        checked(output, BEADS, "init")?;
        Ok(TasksInit::Initialized)
    }

    fn list_issues(&self, workspace: &Path) -> AdapterResult<String> {
        let output = exec::run(BEADS, ["list"], &RunOptions::in_dir(workspace));
        Ok(checked(output, BEADS, "list")?.stdout)
    }

    fn summary(&self, workspace: &Path) -> Option<String> {
        if !self.is_initialized(workspace) {
            return None;
        }
        match self.list_issues(workspace) {
            Ok(listing) => Some(listing),
            Err(err) => {
                debug!(%err, "no beads summary");
                None
            }
        }
    }
}

/// Taskwarrior's global database, filtered by a project named after the
/// workspace leaf.
#[derive(Debug, Clone, Copy, Default)]
pub struct Taskwarrior;

const TASKWARRIOR: &str = "task";

/// `project:<leaf>` filter for a workspace directory.
pub fn project_filter(workspace: &Path) -> String {
    let leaf = workspace
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("project:{leaf}")
}

/// Bare count printed by `task count` → "N tasks".
pub fn format_task_count(output: &str) -> Option<String> {
    let count: u64 = output.trim().parse().ok()?;
    Some(format!("{count} tasks"))
}

impl AdapterInfo for Taskwarrior {
    fn name(&self) -> &str {
        "taskwarrior"
    }

    fn description(&self) -> &str {
        "Taskwarrior CLI task manager"
    }

    fn binary(&self) -> &str {
        TASKWARRIOR
    }

    fn install_hint(&self) -> &str {
        "brew install task"
    }
}

impl TasksAdapter for Taskwarrior {
    fn is_initialized(&self, _workspace: &Path) -> bool {
        true
    }

    fn init(&self, _workspace: &Path) -> AdapterResult<TasksInit> {
        Ok(TasksInit::AlreadyInitialized)
    }

    fn list_issues(&self, workspace: &Path) -> AdapterResult<String> {
        let filter = project_filter(workspace);
        let output = exec::run(TASKWARRIOR, [filter.as_str(), "list"], &RunOptions::default());
        Ok(checked(output, TASKWARRIOR, "list")?.stdout)
    }

    fn summary(&self, workspace: &Path) -> Option<String> {
        let filter = project_filter(workspace);
        let output = exec::run(TASKWARRIOR, [filter.as_str(), "count"], &RunOptions::default());
        if !output.ok {
            debug!(detail = %output.failure_detail(), "no taskwarrior summary");
            return None;
        }
        format_task_count(&output.stdout)
    }
}
