use std::path::Path;

use super::{AdapterError, AdapterInfo, AdapterResult, EditorAdapter};
use crate::exec;

fn open_detached(tool: &str, workspace: &Path) -> AdapterResult<()> {
    if !exec::is_installed(tool) {
        return Err(AdapterError::NotInstalled {
            tool: tool.to_string(),
        });
    }
    exec::spawn_detached(tool, [workspace]).map_err(|err| AdapterError::CommandFailed {
        tool: tool.to_string(),
        action: "open".to_string(),
        detail: err.to_string(),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Cursor;

impl AdapterInfo for Cursor {
    fn name(&self) -> &str {
        "cursor"
    }

    fn description(&self) -> &str {
        "Cursor editor"
    }

    fn binary(&self) -> &str {
        "cursor"
    }

    fn install_hint(&self) -> &str {
        "download from https://cursor.sh"
    }
}

impl EditorAdapter for Cursor {
    fn open(&self, workspace: &Path) -> AdapterResult<()> {
        open_detached(self.binary(), workspace)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VsCode;

impl AdapterInfo for VsCode {
    fn name(&self) -> &str {
        "vscode"
    }

    fn description(&self) -> &str {
        "Visual Studio Code"
    }

    fn binary(&self) -> &str {
        "code"
    }

    fn install_hint(&self) -> &str {
        "brew install --cask visual-studio-code"
    }
}

impl EditorAdapter for VsCode {
    fn open(&self, workspace: &Path) -> AdapterResult<()> {
        open_detached(self.binary(), workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_editor_reports_not_installed() {
        let err = open_detached("ws-definitely-not-a-real-editor", Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, AdapterError::NotInstalled { .. }));
    }

    #[test]
    fn editors_name_their_binaries() {
        assert_eq!(Cursor.binary(), "cursor");
        assert_eq!(VsCode.binary(), "code");
        assert_eq!(VsCode.name(), "vscode");
    }
}
