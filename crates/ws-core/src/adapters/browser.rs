use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{checked, AdapterError, AdapterInfo, AdapterResult, BrowserAdapter, OpenedTabs};
use crate::exec::{self, RunOptions};
use crate::session::Tab;

/// Google Chrome driven through `chrome-cli` (macOS).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeCli;

const CHROME_CLI: &str = "chrome-cli";

impl ChromeCli {
    fn run(&self, args: &[&str]) -> AdapterResult<String> {
        let output = exec::run(CHROME_CLI, args, &RunOptions::default());
        let action = args.first().copied().unwrap_or("run");
        Ok(checked(output, CHROME_CLI, action)?.stdout)
    }

    fn tab_url(&self, tab_id: &str) -> Option<String> {
        match self.run(&["info", "-t", tab_id]) {
            Ok(info) => parse_info_url(&info),
            Err(err) => {
                debug!(tab_id, %err, "skipping tab without info");
                None
            }
        }
    }

    /// Most recently created window, taken as the last one listed.
    fn newest_window(&self) -> Option<String> {
        let listed = self.run(&["list", "windows"]).ok()?;
        parse_windows(&listed).pop().map(|(id, _)| id)
    }
}

impl AdapterInfo for ChromeCli {
    fn name(&self) -> &str {
        "chrome-cli"
    }

    fn description(&self) -> &str {
        "macOS Chrome CLI tool"
    }

    fn binary(&self) -> &str {
        CHROME_CLI
    }

    fn install_hint(&self) -> &str {
        "brew install chrome-cli"
    }
}

impl BrowserAdapter for ChromeCli {
    fn supports_windows(&self) -> bool {
        true
    }

    fn list_tabs(&self, window: Option<&str>) -> AdapterResult<Vec<Tab>> {
        let mut args = vec!["list", "tabs"];
        if let Some(window) = window {
            args.extend(["-w", window]);
        }
        let listed = self.run(&args)?;
        Ok(listed
            .lines()
            .filter_map(parse_tab_line)
            .filter_map(|(tab_id, title)| self.tab_url(&tab_id).map(|url| Tab::new(title, url)))
            .collect())
    }

    fn open_tabs(&self, tabs: &[Tab], window: Option<&str>) -> AdapterResult<OpenedTabs> {
        let mut target = window.map(str::to_string);
        let mut need_window = target.is_none();
        let mut opened = 0;

        for tab in tabs {
            let result = match (&target, need_window) {
                (_, true) => self.run(&["open", &tab.url, "-n"]).map(|out| {
                    need_window = false;
                    target = parse_opened_window(&out).or_else(|| self.newest_window());
                }),
                (Some(id), false) => self.run(&["open", &tab.url, "-w", id]).map(|_| ()),
                (None, false) => self.run(&["open", &tab.url]).map(|_| ()),
            };
            match result {
                Ok(()) => opened += 1,
                Err(AdapterError::NotInstalled { tool }) => {
                    return Err(AdapterError::NotInstalled { tool })
                }
                Err(err) => warn!(url = %tab.url, %err, "failed to open tab"),
            }
        }

        Ok(OpenedTabs {
            opened,
            window_id: target,
        })
    }

    fn open_url(&self, url: &str) -> AdapterResult<()> {
        self.run(&["open", url]).map(|_| ())
    }
}

/// Cross-browser tab control through brotab's `bt`. No window concept.
#[derive(Debug, Clone, Copy, Default)]
pub struct Brotab;

const BROTAB: &str = "bt";

impl AdapterInfo for Brotab {
    fn name(&self) -> &str {
        "brotab"
    }

    fn description(&self) -> &str {
        "Cross-platform browser tab manager"
    }

    fn binary(&self) -> &str {
        BROTAB
    }

    fn install_hint(&self) -> &str {
        "pip install brotab"
    }
}

impl BrowserAdapter for Brotab {
    fn supports_windows(&self) -> bool {
        false
    }

    fn list_tabs(&self, _window: Option<&str>) -> AdapterResult<Vec<Tab>> {
        let output = exec::run(BROTAB, ["list"], &RunOptions::default());
        let output = checked(output, BROTAB, "list")?;
        Ok(parse_brotab_list(&output.stdout))
    }

    fn open_tabs(&self, tabs: &[Tab], _window: Option<&str>) -> AdapterResult<OpenedTabs> {
        let mut opened = 0;
        for tab in tabs {
            match self.open_url(&tab.url) {
                Ok(()) => opened += 1,
                Err(AdapterError::NotInstalled { tool }) => {
                    return Err(AdapterError::NotInstalled { tool })
                }
                Err(err) => warn!(url = %tab.url, %err, "failed to open tab"),
            }
        }
        Ok(OpenedTabs {
            opened,
            window_id: None,
        })
    }

    fn open_url(&self, url: &str) -> AdapterResult<()> {
        let output = exec::run(BROTAB, ["open", url], &RunOptions::default());
        checked(output, BROTAB, "open").map(|_| ())
    }
}

/// `[window:tab] Title` or `[tab] Title` → (tab id, title).
pub fn parse_tab_line(line: &str) -> Option<(String, String)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\[(?:\d+:)?(\d+)\]\s+(.+)$").expect("regex"));
    let caps = re.captures(line.trim())?;
    Some((caps[1].to_string(), caps[2].trim().to_string()))
}

/// `Url: ...` line of `chrome-cli info` output.
pub fn parse_info_url(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Url:"))
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// `[id] Title` lines of `chrome-cli list windows`, in listed order.
pub fn parse_windows(output: &str) -> Vec<(String, String)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\[(\d+)\]\s+(.+)$").expect("regex"));
    output
        .lines()
        .filter_map(|line| re.captures(line.trim()))
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
        .collect()
}

/// Window id reported by `chrome-cli open -n`, when present.
pub fn parse_opened_window(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Window id:"))
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Tab-separated `id  title  url` rows of `bt list`; rows without a URL are
/// dropped.
pub fn parse_brotab_list(output: &str) -> Vec<Tab> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let _id = parts.next();
            let title = parts.next().unwrap_or_default().trim();
            let url = parts.next().unwrap_or_default().trim();
            (!url.is_empty()).then(|| Tab::new(title, url))
        })
        .collect()
}
