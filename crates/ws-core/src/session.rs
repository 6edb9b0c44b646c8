use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::workspace::{io_err, WorkspaceError, STATE_DIR, TABS_FILE};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    #[serde(default)]
    pub title: String,
    pub url: String,
}

impl Tab {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Open-state of a workspace. Absence of the file means "not tracked as open".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// RFC3339 timestamp
    pub opened_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_window_id: Option<String>,
}

impl SessionRecord {
    pub fn opened_now() -> Self {
        Self {
            opened_at: now_rfc3339(),
            browser_window_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabsCapture {
    pub captured_at: String,
    pub tabs: Vec<Tab>,
}

pub fn now_rfc3339() -> String {
    let now: DateTime<Local> = Local::now();
    now.to_rfc3339()
}

pub fn state_dir(workspace_dir: &Path) -> PathBuf {
    workspace_dir.join(STATE_DIR)
}

pub fn session_path(workspace_dir: &Path) -> PathBuf {
    state_dir(workspace_dir).join("session.json")
}

pub fn tabs_path(workspace_dir: &Path) -> PathBuf {
    workspace_dir.join(TABS_FILE)
}

pub fn tabs_history_path(workspace_dir: &Path) -> PathBuf {
    state_dir(workspace_dir).join("tabs-history.jsonl")
}

/// `None` when no session is recorded or the file cannot be parsed.
pub fn read_session(workspace_dir: &Path) -> Option<SessionRecord> {
    let path = session_path(workspace_dir);
    let raw = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring unreadable session file");
            None
        }
    }
}

pub fn write_session(workspace_dir: &Path, session: &SessionRecord) -> Result<PathBuf, WorkspaceError> {
    let dir = state_dir(workspace_dir);
    fs::create_dir_all(&dir).map_err(io_err(&dir))?;
    let path = session_path(workspace_dir);
    write_json(&path, session)?;
    Ok(path)
}

/// Returns whether a session file was removed.
pub fn clear_session(workspace_dir: &Path) -> Result<bool, WorkspaceError> {
    let path = session_path(workspace_dir);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).map_err(io_err(&path))?;
    Ok(true)
}

/// Last saved tab list; empty when missing or corrupt.
pub fn read_tabs(workspace_dir: &Path) -> Vec<Tab> {
    let path = tabs_path(workspace_dir);
    let Ok(raw) = fs::read_to_string(&path) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(tabs) => tabs,
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring unreadable tab snapshot");
            Vec::new()
        }
    }
}

/// Replace the tab snapshot wholesale. The list is written to a sibling
/// temp file first and renamed into place.
pub fn write_tabs(workspace_dir: &Path, tabs: &[Tab]) -> Result<PathBuf, WorkspaceError> {
    let path = tabs_path(workspace_dir);
    write_json(&path, &tabs)?;
    Ok(path)
}

pub fn append_tabs_history(
    workspace_dir: &Path,
    tabs: &[Tab],
) -> Result<PathBuf, WorkspaceError> {
    let dir = state_dir(workspace_dir);
    fs::create_dir_all(&dir).map_err(io_err(&dir))?;
    let path = tabs_history_path(workspace_dir);
    let record = TabsCapture {
        captured_at: now_rfc3339(),
        tabs: tabs.to_vec(),
    };
    let line = serde_json::to_string(&record).map_err(|source| WorkspaceError::Encode {
        path: path.clone(),
        source,
    })?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_err(&path))?;
    writeln!(file, "{line}").map_err(io_err(&path))?;
    Ok(path)
}

/// Every capture recorded in the history log, oldest first. Lines that do
/// not parse are skipped.
pub fn read_tabs_history(workspace_dir: &Path) -> Vec<TabsCapture> {
    let Ok(raw) = fs::read_to_string(tabs_history_path(workspace_dir)) else {
        return Vec::new();
    };
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), WorkspaceError> {
    let mut body = serde_json::to_string_pretty(value).map_err(|source| WorkspaceError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    body.push('\n');
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, body).map_err(io_err(&staging))?;
    fs::rename(&staging, path).map_err(io_err(path))
}
