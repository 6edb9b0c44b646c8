use std::env;
use std::path::Path;

use super::{
    checked, AdapterError, AdapterInfo, AdapterResult, SessionCreate, TerminalAdapter,
    TerminalSession,
};
use crate::exec::{self, CommandOutput, RunOptions};

const TMUX: &str = "tmux";
const ZELLIJ: &str = "zellij";

/// Format requested from `tmux list-sessions -F`.
pub const TMUX_SESSION_FORMAT: &str = "#{session_name}:#{session_windows}:#{session_attached}";

fn live(tool: &str, action: &str, args: &[&str]) -> AdapterResult<()> {
    if !exec::is_installed(tool) {
        return Err(AdapterError::NotInstalled {
            tool: tool.to_string(),
        });
    }
    if exec::run_live(tool, args) {
        Ok(())
    } else {
        Err(AdapterError::CommandFailed {
            tool: tool.to_string(),
            action: action.to_string(),
            detail: "exited with failure".to_string(),
        })
    }
}

/// Listing commands fail when no server is running; that is an empty list,
/// not an error. A missing binary still is.
fn listing(output: CommandOutput, tool: &str) -> AdapterResult<Option<String>> {
    if !output.launched {
        return Err(AdapterError::NotInstalled {
            tool: tool.to_string(),
        });
    }
    Ok(output.ok.then_some(output.stdout))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tmux;

impl AdapterInfo for Tmux {
    fn name(&self) -> &str {
        "tmux"
    }

    fn description(&self) -> &str {
        "Terminal multiplexer"
    }

    fn binary(&self) -> &str {
        TMUX
    }

    fn install_hint(&self) -> &str {
        "brew install tmux"
    }
}

impl TerminalAdapter for Tmux {
    fn session_exists(&self, session: &str) -> bool {
        exec::run(TMUX, ["has-session", "-t", session], &RunOptions::default()).ok
    }

    fn create_session(&self, session: &str, cwd: &Path) -> AdapterResult<SessionCreate> {
        if self.session_exists(session) {
            return Ok(SessionCreate::AlreadyExisted);
        }
        let cwd = cwd.to_string_lossy();
        let output = exec::run(
            TMUX,
            ["new-session", "-d", "-s", session, "-c", cwd.as_ref()],
            &RunOptions::default(),
        );
        checked(output, TMUX, "new-session")?;
        Ok(SessionCreate::Created)
    }

    fn attach_session(&self, session: &str) -> AdapterResult<()> {
        if env::var_os("TMUX").is_some() {
            live(TMUX, "switch-client", &["switch-client", "-t", session])
        } else {
            live(TMUX, "attach", &["attach", "-t", session])
        }
    }

    fn kill_session(&self, session: &str) -> AdapterResult<()> {
        let output = exec::run(TMUX, ["kill-session", "-t", session], &RunOptions::default());
        checked(output, TMUX, "kill-session").map(|_| ())
    }

    fn list_sessions(&self) -> AdapterResult<Vec<TerminalSession>> {
        let output = exec::run(
            TMUX,
            ["list-sessions", "-F", TMUX_SESSION_FORMAT],
            &RunOptions::default(),
        );
        Ok(listing(output, TMUX)?
            .map(|stdout| parse_tmux_sessions(&stdout))
            .unwrap_or_default())
    }
}

/// Lines of `name:windows:attached`. Session names may themselves contain
/// ':' so the numeric fields are taken from the right.
pub fn parse_tmux_sessions(output: &str) -> Vec<TerminalSession> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut parts = line.rsplitn(3, ':');
            let attached = parts.next()?;
            let windows = parts.next()?;
            let name = parts.next()?;
            Some(TerminalSession {
                name: name.to_string(),
                windows: windows.parse().unwrap_or(0),
                attached: attached.parse::<u32>().map(|n| n > 0).unwrap_or(false),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Zellij;

impl Zellij {
    fn sessions_output(&self) -> AdapterResult<Option<String>> {
        let output = exec::run(
            ZELLIJ,
            ["list-sessions", "--no-formatting"],
            &RunOptions::default(),
        );
        listing(output, ZELLIJ)
    }
}

impl AdapterInfo for Zellij {
    fn name(&self) -> &str {
        "zellij"
    }

    fn description(&self) -> &str {
        "Zellij terminal workspace"
    }

    fn binary(&self) -> &str {
        ZELLIJ
    }

    fn install_hint(&self) -> &str {
        "brew install zellij"
    }
}

impl TerminalAdapter for Zellij {
    fn session_exists(&self, session: &str) -> bool {
        matches!(
            self.sessions_output(),
            Ok(Some(stdout)) if parse_zellij_sessions(&stdout).iter().any(|s| s.name == session)
        )
    }

    fn create_session(&self, session: &str, cwd: &Path) -> AdapterResult<SessionCreate> {
        if self.session_exists(session) {
            return Ok(SessionCreate::AlreadyExisted);
        }
        let output = exec::run(
            ZELLIJ,
            ["attach", "--create-background", session],
            &RunOptions::in_dir(cwd),
        );
        checked(output, ZELLIJ, "attach --create-background")?;
        Ok(SessionCreate::Created)
    }

    fn attach_session(&self, session: &str) -> AdapterResult<()> {
        if env::var_os("ZELLIJ").is_some() {
            return Err(AdapterError::Unsupported(format!(
                "already inside zellij; detach and run `zellij attach {session}`"
            )));
        }
        live(ZELLIJ, "attach", &["attach", session])
    }

    fn kill_session(&self, session: &str) -> AdapterResult<()> {
        let output = exec::run(ZELLIJ, ["kill-session", session], &RunOptions::default());
        checked(output, ZELLIJ, "kill-session").map(|_| ())
    }

    fn list_sessions(&self) -> AdapterResult<Vec<TerminalSession>> {
        Ok(self
            .sessions_output()?
            .map(|stdout| parse_zellij_sessions(&stdout))
            .unwrap_or_default())
    }
}

/// `zellij list-sessions --no-formatting` lines start with the session name;
/// the current session is tagged `(current)`. Window counts are not reported.
pub fn parse_zellij_sessions(output: &str) -> Vec<TerminalSession> {
    output
        .lines()
        .filter_map(|line| {
            let name = line.split_whitespace().next()?;
            Some(TerminalSession {
                name: name.to_string(),
                windows: 0,
                attached: line.contains("(current)"),
            })
        })
        .collect()
}
