use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::browser::{Brotab, ChromeCli};
use super::editor::{Cursor, VsCode};
use super::tasks::{Beads, Taskwarrior};
use super::terminal::{Tmux, Zellij};
use super::{AdapterInfo, BrowserAdapter, Category, EditorAdapter, TasksAdapter, TerminalAdapter};
use crate::config::WsConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown adapter category: {0}")]
    UnknownCategory(String),
    #[error("Unknown {category} adapter: \"{name}\". Available: {}", .available.join(", "))]
    UnknownAdapter {
        category: Category,
        name: String,
        available: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdapterListing {
    pub name: String,
    pub description: String,
}

/// A resolved adapter of any category.
#[derive(Clone, Copy)]
pub enum AdapterRef<'a> {
    Browser(&'a dyn BrowserAdapter),
    Tasks(&'a dyn TasksAdapter),
    Terminal(&'a dyn TerminalAdapter),
    Editor(&'a dyn EditorAdapter),
}

macro_rules! delegate {
    ($self:ident, $adapter:ident => $body:expr) => {
        match $self {
            AdapterRef::Browser($adapter) => $body,
            AdapterRef::Tasks($adapter) => $body,
            AdapterRef::Terminal($adapter) => $body,
            AdapterRef::Editor($adapter) => $body,
        }
    };
}

impl<'a> AdapterRef<'a> {
    pub fn category(&self) -> Category {
        match self {
            AdapterRef::Browser(_) => Category::Browser,
            AdapterRef::Tasks(_) => Category::Tasks,
            AdapterRef::Terminal(_) => Category::Terminal,
            AdapterRef::Editor(_) => Category::Editor,
        }
    }

    pub fn name(&self) -> &'a str {
        delegate!(self, adapter => adapter.name())
    }

    pub fn description(&self) -> &'a str {
        delegate!(self, adapter => adapter.description())
    }

    pub fn binary(&self) -> &'a str {
        delegate!(self, adapter => adapter.binary())
    }

    pub fn install_hint(&self) -> &'a str {
        delegate!(self, adapter => adapter.install_hint())
    }

    pub fn is_available(&self) -> bool {
        delegate!(self, adapter => adapter.is_available())
    }
}

/// Every known adapter, keyed by category and name.
pub struct Registry {
    browser: BTreeMap<String, Box<dyn BrowserAdapter>>,
    tasks: BTreeMap<String, Box<dyn TasksAdapter>>,
    terminal: BTreeMap<String, Box<dyn TerminalAdapter>>,
    editor: BTreeMap<String, Box<dyn EditorAdapter>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            browser: BTreeMap::new(),
            tasks: BTreeMap::new(),
            terminal: BTreeMap::new(),
            editor: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry
            .register_browser(ChromeCli)
            .register_browser(Brotab)
            .register_tasks(Beads)
            .register_tasks(Taskwarrior)
            .register_terminal(Tmux)
            .register_terminal(Zellij)
            .register_editor(Cursor)
            .register_editor(VsCode);
        registry
    }

    pub fn register_browser(&mut self, adapter: impl BrowserAdapter + 'static) -> &mut Self {
        self.browser.insert(adapter.name().to_string(), Box::new(adapter));
        self
    }

    pub fn register_tasks(&mut self, adapter: impl TasksAdapter + 'static) -> &mut Self {
        self.tasks.insert(adapter.name().to_string(), Box::new(adapter));
        self
    }

    pub fn register_terminal(&mut self, adapter: impl TerminalAdapter + 'static) -> &mut Self {
        self.terminal.insert(adapter.name().to_string(), Box::new(adapter));
        self
    }

    pub fn register_editor(&mut self, adapter: impl EditorAdapter + 'static) -> &mut Self {
        self.editor.insert(adapter.name().to_string(), Box::new(adapter));
        self
    }

    pub fn names(&self, category: Category) -> Vec<String> {
        match category {
            Category::Browser => self.browser.keys().cloned().collect(),
            Category::Tasks => self.tasks.keys().cloned().collect(),
            Category::Terminal => self.terminal.keys().cloned().collect(),
            Category::Editor => self.editor.keys().cloned().collect(),
        }
    }

    pub fn resolve(&self, category: Category, name: &str) -> Result<AdapterRef<'_>, RegistryError> {
        Ok(match category {
            Category::Browser => AdapterRef::Browser(self.browser(name)?),
            Category::Tasks => AdapterRef::Tasks(self.tasks(name)?),
            Category::Terminal => AdapterRef::Terminal(self.terminal(name)?),
            Category::Editor => AdapterRef::Editor(self.editor(name)?),
        })
    }

    /// Like [`Registry::resolve`] but with the category given as text.
    pub fn resolve_named(&self, category: &str, name: &str) -> Result<AdapterRef<'_>, RegistryError> {
        self.resolve(category.parse()?, name)
    }

    pub fn browser(&self, name: &str) -> Result<&dyn BrowserAdapter, RegistryError> {
        lookup(&self.browser, Category::Browser, name)
    }

    pub fn tasks(&self, name: &str) -> Result<&dyn TasksAdapter, RegistryError> {
        lookup(&self.tasks, Category::Tasks, name)
    }

    pub fn terminal(&self, name: &str) -> Result<&dyn TerminalAdapter, RegistryError> {
        lookup(&self.terminal, Category::Terminal, name)
    }

    pub fn editor(&self, name: &str) -> Result<&dyn EditorAdapter, RegistryError> {
        lookup(&self.editor, Category::Editor, name)
    }

    /// The configured adapter for `category`. `Ok(None)` means nothing is
    /// configured and the feature is skipped; a configured name the registry
    /// does not know is an error.
    pub fn resolve_for_config(
        &self,
        config: &WsConfig,
        category: Category,
    ) -> Result<Option<AdapterRef<'_>>, RegistryError> {
        config
            .adapters
            .get(category)
            .map(|name| self.resolve(category, name))
            .transpose()
    }

    pub fn browser_for(&self, config: &WsConfig) -> Result<Option<&dyn BrowserAdapter>, RegistryError> {
        config
            .adapters
            .get(Category::Browser)
            .map(|name| self.browser(name))
            .transpose()
    }

    pub fn tasks_for(&self, config: &WsConfig) -> Result<Option<&dyn TasksAdapter>, RegistryError> {
        config
            .adapters
            .get(Category::Tasks)
            .map(|name| self.tasks(name))
            .transpose()
    }

    pub fn terminal_for(&self, config: &WsConfig) -> Result<Option<&dyn TerminalAdapter>, RegistryError> {
        config
            .adapters
            .get(Category::Terminal)
            .map(|name| self.terminal(name))
            .transpose()
    }

    pub fn editor_for(&self, config: &WsConfig) -> Result<Option<&dyn EditorAdapter>, RegistryError> {
        config
            .adapters
            .get(Category::Editor)
            .map(|name| self.editor(name))
            .transpose()
    }

    /// Names and descriptions of every registered adapter, per category.
    pub fn list(&self) -> BTreeMap<Category, Vec<AdapterListing>> {
        fn listing<T: AdapterInfo + ?Sized>(map: &BTreeMap<String, Box<T>>) -> Vec<AdapterListing> {
            map.values()
                .map(|adapter| AdapterListing {
                    name: adapter.name().to_string(),
                    description: adapter.description().to_string(),
                })
                .collect()
        }

        BTreeMap::from([
            (Category::Browser, listing(&self.browser)),
            (Category::Tasks, listing(&self.tasks)),
            (Category::Terminal, listing(&self.terminal)),
            (Category::Editor, listing(&self.editor)),
        ])
    }
}

fn lookup<'a, T: ?Sized>(
    map: &'a BTreeMap<String, Box<T>>,
    category: Category,
    name: &str,
) -> Result<&'a T, RegistryError> {
    map.get(name.trim())
        .map(|adapter| adapter.as_ref())
        .ok_or_else(|| RegistryError::UnknownAdapter {
            category,
            name: name.to_string(),
            available: map.keys().cloned().collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_knows_every_category() {
        let registry = Registry::builtin();
        let listed = registry.list();
        assert_eq!(listed.len(), 4);
        assert_eq!(registry.names(Category::Browser), vec!["brotab", "chrome-cli"]);
        assert_eq!(registry.names(Category::Tasks), vec!["beads", "taskwarrior"]);
        assert_eq!(registry.names(Category::Terminal), vec!["tmux", "zellij"]);
        assert_eq!(registry.names(Category::Editor), vec!["cursor", "vscode"]);
        assert!(listed[&Category::Editor]
            .iter()
            .all(|entry| !entry.description.is_empty()));
    }

    #[test]
    fn resolve_reports_alternatives_for_unknown_names() {
        let registry = Registry::builtin();
        let err = registry.resolve(Category::Terminal, "screen").err().expect("error");
        assert_eq!(
            err,
            RegistryError::UnknownAdapter {
                category: Category::Terminal,
                name: "screen".to_string(),
                available: vec!["tmux".to_string(), "zellij".to_string()],
            }
        );
        assert_eq!(
            err.to_string(),
            "Unknown terminal adapter: \"screen\". Available: tmux, zellij"
        );
    }

    #[test]
    fn resolve_named_rejects_unknown_categories() {
        let registry = Registry::builtin();
        assert!(matches!(
            registry.resolve_named("printer", "lp").err(),
            Some(RegistryError::UnknownCategory(_))
        ));
        let adapter = registry.resolve_named("editor", "vscode").expect("vscode");
        assert_eq!(adapter.category(), Category::Editor);
        assert_eq!(adapter.binary(), "code");
    }

    #[test]
    fn unconfigured_category_resolves_to_none() {
        let registry = Registry::builtin();
        let mut config = WsConfig::default();
        config.adapters.browser = None;
        config.adapters.tasks = Some("   ".to_string());
        assert!(registry.browser_for(&config).expect("browser").is_none());
        assert!(registry
            .resolve_for_config(&config, Category::Tasks)
            .expect("tasks")
            .is_none());
        let terminal = registry.terminal_for(&config).expect("terminal").expect("tmux");
        assert_eq!(terminal.name(), "tmux");
    }

    #[test]
    fn configured_unknown_adapter_is_an_error() {
        let registry = Registry::builtin();
        let mut config = WsConfig::default();
        config.adapters.editor = Some("notepad".to_string());
        let err = registry.editor_for(&config).err().expect("error");
        assert!(err.to_string().contains("Available: cursor, vscode"));
    }
}
