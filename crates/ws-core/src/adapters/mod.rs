//! Capability contracts for the external tools a workspace drives, plus the
//! registry that maps configured names onto implementations.
//!
//! Every adapter is a thin translation layer between one of the traits below
//! and a single executable's own argument syntax and output format.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::exec::{self, CommandOutput};
use crate::session::Tab;

pub mod browser;
pub mod editor;
pub mod registry;
pub mod tasks;
pub mod terminal;

pub use registry::{AdapterListing, AdapterRef, Registry, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Browser,
    Tasks,
    Terminal,
    Editor,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Browser,
        Category::Tasks,
        Category::Terminal,
        Category::Editor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Browser => "browser",
            Category::Tasks => "tasks",
            Category::Terminal => "terminal",
            Category::Editor => "editor",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = RegistryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == value.trim())
            .ok_or_else(|| RegistryError::UnknownCategory(value.to_string()))
    }
}

/// Failure of one adapter operation. Always recoverable: orchestrators
/// report it and move on.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{tool} is not installed")]
    NotInstalled { tool: String },
    #[error("{tool} {action} failed: {detail}")]
    CommandFailed {
        tool: String,
        action: String,
        detail: String,
    },
    #[error("{tool} returned unexpected output: {detail}")]
    Malformed { tool: String, detail: String },
    #[error("{0}")]
    Unsupported(String),
}

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Map a scripted run onto the adapter error taxonomy.
pub(crate) fn checked(output: CommandOutput, tool: &str, action: &str) -> AdapterResult<CommandOutput> {
    if output.ok {
        return Ok(output);
    }
    if !output.launched {
        return Err(AdapterError::NotInstalled {
            tool: tool.to_string(),
        });
    }
    Err(AdapterError::CommandFailed {
        tool: tool.to_string(),
        action: action.to_string(),
        detail: output.failure_detail(),
    })
}

/// Identity and install metadata shared by every adapter.
pub trait AdapterInfo {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// Executable the adapter shells out to.
    fn binary(&self) -> &str;
    fn install_hint(&self) -> &str;

    fn is_available(&self) -> bool {
        exec::is_installed(self.binary())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedTabs {
    pub opened: usize,
    /// Window the tabs landed in; `None` for tools without windows.
    pub window_id: Option<String>,
}

pub trait BrowserAdapter: AdapterInfo {
    /// Whether `window` arguments are honored. Tools without a window
    /// concept ignore them.
    fn supports_windows(&self) -> bool;

    /// Tabs of one window, or with `window == None` the union across every
    /// window. The unscoped form can pick up tabs that belong to another
    /// workspace; callers should warn when they fall back to it.
    fn list_tabs(&self, window: Option<&str>) -> AdapterResult<Vec<Tab>>;

    /// Open each tab independently; a failed tab does not stop the rest.
    /// Without a `window`, window-aware tools open the first tab in a fresh
    /// window and report its id so later captures can be scoped to it.
    fn open_tabs(&self, tabs: &[Tab], window: Option<&str>) -> AdapterResult<OpenedTabs>;

    fn open_url(&self, url: &str) -> AdapterResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasksInit {
    Initialized,
    AlreadyInitialized,
}

pub trait TasksAdapter: AdapterInfo {
    fn is_initialized(&self, workspace: &Path) -> bool;
    /// Idempotent: a second call reports `AlreadyInitialized`.
    fn init(&self, workspace: &Path) -> AdapterResult<TasksInit>;
    fn list_issues(&self, workspace: &Path) -> AdapterResult<String>;
    /// `None` when the tracker has nothing to say about this workspace.
    fn summary(&self, workspace: &Path) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCreate {
    Created,
    AlreadyExisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalSession {
    pub name: String,
    pub windows: u32,
    pub attached: bool,
}

pub trait TerminalAdapter: AdapterInfo {
    fn session_exists(&self, session: &str) -> bool;
    /// Idempotent: an existing session is left alone.
    fn create_session(&self, session: &str, cwd: &Path) -> AdapterResult<SessionCreate>;
    /// Hand the terminal over to the session, blocking until the user
    /// detaches. Switches instead of nesting when already inside the
    /// multiplexer.
    fn attach_session(&self, session: &str) -> AdapterResult<()>;
    fn kill_session(&self, session: &str) -> AdapterResult<()>;
    fn list_sessions(&self) -> AdapterResult<Vec<TerminalSession>>;
}

pub trait EditorAdapter: AdapterInfo {
    /// Launch detached; never waits for the editor to exit.
    fn open(&self, workspace: &Path) -> AdapterResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().expect("parse"), category);
        }
        assert!(matches!(
            "printer".parse::<Category>(),
            Err(RegistryError::UnknownCategory(_))
        ));
    }

    #[test]
    fn checked_distinguishes_missing_tools_from_failures() {
        let missing = exec::run(
            "ws-definitely-not-a-real-binary",
            Vec::<String>::new(),
            &exec::RunOptions::default(),
        );
        assert!(matches!(
            checked(missing, "fake", "list"),
            Err(AdapterError::NotInstalled { .. })
        ));

        let failed = CommandOutput {
            ok: false,
            stdout: String::new(),
            stderr: "no server running".to_string(),
            code: Some(1),
            launched: true,
            timed_out: false,
        };
        let err = checked(failed, "tmux", "list-sessions").unwrap_err();
        assert_eq!(err.to_string(), "tmux list-sessions failed: no server running");
    }
}
