//! Environment diagnostics: is the root there, and are the configured tools
//! on `PATH`. Nothing is installed; missing tools come with a hint instead.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::adapters::{Category, Registry};
use crate::config::WsConfig;
use crate::exec;
use crate::workspace::{io_err, WorkspaceError};

/// Helpers that improve the experience but nothing depends on.
pub const OPTIONAL_TOOLS: &[(&str, &str, &str)] = &[
    ("fzf", "Fuzzy finder for workspace selection", "brew install fzf"),
    ("zoxide", "Smart directory jumping", "brew install zoxide"),
    ("jq", "JSON processing", "brew install jq"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum CheckState {
    NotConfigured,
    Installed,
    Missing { install_hint: String },
    /// The configured name is not a registered adapter.
    Unknown { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterCheck {
    pub category: Category,
    pub adapter: Option<String>,
    pub binary: Option<String>,
    #[serde(flatten)]
    pub state: CheckState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCheck {
    pub tool: String,
    pub description: String,
    pub installed: bool,
    pub install_hint: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub root: PathBuf,
    pub root_existed: bool,
    /// False on a dry run when the root is missing.
    pub root_created: bool,
    pub adapters: Vec<AdapterCheck>,
    pub optional: Vec<ToolCheck>,
}

impl SetupReport {
    pub fn missing_count(&self) -> usize {
        let adapters = self
            .adapters
            .iter()
            .filter(|check| matches!(check.state, CheckState::Missing { .. }))
            .count();
        adapters + self.optional.iter().filter(|tool| !tool.installed).count()
    }
}

pub fn check_adapters(config: &WsConfig, registry: &Registry) -> Vec<AdapterCheck> {
    Category::ALL
        .into_iter()
        .map(|category| {
            let Some(name) = config.adapters.get(category) else {
                return AdapterCheck {
                    category,
                    adapter: None,
                    binary: None,
                    state: CheckState::NotConfigured,
                };
            };
            match registry.resolve(category, name) {
                Ok(adapter) => AdapterCheck {
                    category,
                    adapter: Some(name.to_string()),
                    binary: Some(adapter.binary().to_string()),
                    state: if adapter.is_available() {
                        CheckState::Installed
                    } else {
                        CheckState::Missing {
                            install_hint: adapter.install_hint().to_string(),
                        }
                    },
                },
                Err(err) => AdapterCheck {
                    category,
                    adapter: Some(name.to_string()),
                    binary: None,
                    state: CheckState::Unknown {
                        error: err.to_string(),
                    },
                },
            }
        })
        .collect()
}

pub fn check_optional_tools() -> Vec<ToolCheck> {
    OPTIONAL_TOOLS
        .iter()
        .map(|(tool, description, hint)| ToolCheck {
            tool: tool.to_string(),
            description: description.to_string(),
            installed: exec::is_installed(tool),
            install_hint: hint.to_string(),
        })
        .collect()
}

/// Ensure the workspace root exists (unless `dry_run`) and report on every
/// configured adapter.
pub fn setup(
    config: &WsConfig,
    registry: &Registry,
    dry_run: bool,
) -> Result<SetupReport, WorkspaceError> {
    let root = config.resolve_root();
    let root_existed = root.is_dir();
    let mut root_created = false;
    if !root_existed && !dry_run {
        fs::create_dir_all(&root).map_err(io_err(&root))?;
        root_created = true;
    }
    Ok(SetupReport {
        root,
        root_existed,
        root_created,
        adapters: check_adapters(config, registry),
        optional: check_optional_tools(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn setup_creates_root_unless_dry_run() {
        let temp = TempDir::new().expect("tempdir");
        let mut config = WsConfig::default();
        config.root = temp.path().join("ws").display().to_string();
        let registry = Registry::builtin();

        let dry = setup(&config, &registry, true).expect("dry run");
        assert!(!dry.root_existed);
        assert!(!dry.root_created);
        assert!(!temp.path().join("ws").exists());

        let real = setup(&config, &registry, false).expect("setup");
        assert!(real.root_created);
        assert!(temp.path().join("ws").is_dir());
        assert_eq!(real.adapters.len(), 4);
    }

    #[test]
    fn adapter_checks_cover_unconfigured_and_unknown() {
        let mut config = WsConfig::default();
        config.adapters.browser = None;
        config.adapters.editor = Some("notepad".to_string());
        let checks = check_adapters(&config, &Registry::builtin());

        assert_eq!(checks[0].category, Category::Browser);
        assert_eq!(checks[0].state, CheckState::NotConfigured);
        assert!(matches!(
            &checks[3].state,
            CheckState::Unknown { error } if error.contains("Available: cursor, vscode")
        ));
        assert_eq!(checks[2].binary.as_deref(), Some("tmux"));
        assert!(matches!(
            checks[2].state,
            CheckState::Installed | CheckState::Missing { .. }
        ));
    }
}
