use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::Category;
use crate::workspace::Status;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Unable to resolve home directory; set WS_CONFIG_DIR to an absolute path")]
    NoHome,
    #[error("Key \"{0}\" not found")]
    UnknownKey(String),
    #[error("Invalid value for \"{key}\": {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("Preset \"{0}\" not found")]
    PresetNotFound(String),
    #[error("Failed to parse preset {path}: {source}")]
    PresetParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Adapter name per category. An absent or blank entry means the category is
/// not configured and every feature depending on it is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

impl AdapterSelection {
    pub fn get(&self, category: Category) -> Option<&str> {
        let value = match category {
            Category::Browser => self.browser.as_deref(),
            Category::Tasks => self.tasks.as_deref(),
            Category::Terminal => self.terminal.as_deref(),
            Category::Editor => self.editor.as_deref(),
        };
        value.map(str::trim).filter(|name| !name.is_empty())
    }

    pub fn set(&mut self, category: Category, name: Option<String>) {
        let slot = match category {
            Category::Browser => &mut self.browser,
            Category::Tasks => &mut self.tasks,
            Category::Terminal => &mut self.terminal,
            Category::Editor => &mut self.editor,
        };
        *slot = name;
    }

    /// Overlay every category `other` names onto `self`.
    pub fn merge(&mut self, other: &AdapterSelection) {
        for category in Category::ALL {
            if let Some(name) = other.get(category) {
                self.set(category, Some(name.to_string()));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceDefaults {
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for WorkspaceDefaults {
    fn default() -> Self {
        Self {
            status: Status::Active,
            tags: Vec::new(),
        }
    }
}

/// Process-wide settings, loaded once per invocation and passed explicitly.
///
/// Top-level keys missing from the file fall back to [`WsConfig::default`];
/// a present `[adapters]` table is taken as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WsConfig {
    pub root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    pub adapters: AdapterSelection,
    pub workspace_defaults: WorkspaceDefaults,
    /// 0 disables periodic snapshots.
    pub auto_snapshot_minutes: u32,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            root: "~/Workspaces".to_string(),
            preset: Some("macos-default".to_string()),
            adapters: AdapterSelection {
                browser: Some("chrome-cli".to_string()),
                tasks: Some("beads".to_string()),
                terminal: Some("tmux".to_string()),
                editor: Some("cursor".to_string()),
            },
            workspace_defaults: WorkspaceDefaults::default(),
            auto_snapshot_minutes: 0,
        }
    }
}

impl WsConfig {
    /// Workspace root with a leading `~` expanded.
    pub fn resolve_root(&self) -> PathBuf {
        expand_home(self.root.trim())
    }

    pub fn get_value(&self, key: &str) -> Result<toml::Value, ConfigError> {
        let tree = toml::Value::try_from(self)?;
        lookup(&tree, key)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
    }

    /// Set a dotted key from its textual form. JSON literals (numbers,
    /// booleans, arrays) are honored when the field accepts them; anything
    /// else is stored as a string.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let literal = toml::Value::String(raw.to_string());
        let updated = match parse_raw_value(raw) {
            Some(typed) => self
                .with_value(key, typed)
                .or_else(|_| self.with_value(key, literal))?,
            None => self.with_value(key, literal)?,
        };
        *self = updated;
        Ok(())
    }

    fn with_value(&self, key: &str, value: toml::Value) -> Result<WsConfig, ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let segments: Vec<&str> = key.split('.').collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(unknown());
        }
        let (leaf, parents) = segments.split_last().ok_or_else(unknown)?;

        let mut tree = toml::Value::try_from(self)?;
        let mut table = tree.as_table_mut().ok_or_else(unknown)?;
        for segment in parents {
            table = table
                .entry(segment.to_string())
                .or_insert_with(|| toml::Value::Table(toml::map::Map::new()))
                .as_table_mut()
                .ok_or_else(unknown)?;
        }
        table.insert(leaf.to_string(), value.clone());

        let updated: WsConfig = tree.try_into().map_err(|err: toml::de::Error| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                reason: err.message().to_string(),
            }
        })?;
        let stored = toml::Value::try_from(&updated)?;
        if lookup(&stored, key) != Some(&value) {
            return Err(unknown());
        }
        Ok(updated)
    }
}

fn lookup<'a>(tree: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(tree, |node, segment| node.as_table()?.get(segment))
}

fn parse_raw_value(raw: &str) -> Option<toml::Value> {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .filter(|value| !value.is_null() && !value.is_object() && !value.is_string())
        .and_then(|value| toml::Value::try_from(value).ok())
}

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    if let Ok(profile) = std::env::var("USERPROFILE") {
        let trimmed = profile.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    None
}

pub fn expand_home(value: &str) -> PathBuf {
    if value == "~" {
        return resolve_user_home_dir().unwrap_or_else(|| PathBuf::from(value));
    }
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = resolve_user_home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(value)
}

pub fn resolve_config_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(value) = std::env::var("WS_CONFIG_DIR") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir()
        .map(|home| home.join(".config").join("ws"))
        .ok_or(ConfigError::NoHome)
}

/// File-backed home of the configuration and user presets.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        resolve_config_dir().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.toml")
    }

    pub fn presets_dir(&self) -> PathBuf {
        self.dir.join("presets")
    }

    /// Load the config, writing the defaults first when no file exists.
    pub fn load(&self) -> Result<WsConfig, ConfigError> {
        self.ensure_dirs()?;
        let path = self.config_path();
        if !path.is_file() {
            let config = WsConfig::default();
            self.save(&config)?;
            return Ok(config);
        }
        let text = fs::read_to_string(&path)?;
        Ok(toml::from_str::<WsConfig>(&text)?)
    }

    pub fn save(&self, config: &WsConfig) -> Result<PathBuf, ConfigError> {
        self.ensure_dirs()?;
        let path = self.config_path();
        let body = toml::to_string_pretty(config)?;
        fs::write(&path, body)?;
        Ok(path)
    }

    fn ensure_dirs(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.dir)?;
        fs::create_dir_all(self.presets_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::ffi::OsString;
    use tempfile::TempDir;

    struct EnvGuard {
        config_dir: Option<OsString>,
        home: Option<OsString>,
    }

    impl EnvGuard {
        fn capture() -> Self {
            Self {
                config_dir: std::env::var_os("WS_CONFIG_DIR"),
                home: std::env::var_os("HOME"),
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.config_dir.as_ref() {
                std::env::set_var("WS_CONFIG_DIR", value);
            } else {
                std::env::remove_var("WS_CONFIG_DIR");
            }
            if let Some(value) = self.home.as_ref() {
                std::env::set_var("HOME", value);
            } else {
                std::env::remove_var("HOME");
            }
        }
    }

    #[test]
    fn load_writes_defaults_when_missing() {
        let temp = TempDir::new().expect("tempdir");
        let store = ConfigStore::new(temp.path().join("ws"));
        let config = store.load().expect("load");
        assert_eq!(config, WsConfig::default());
        assert!(store.config_path().is_file());
        assert!(store.presets_dir().is_dir());
    }

    #[test]
    fn write_and_read_config() {
        let temp = TempDir::new().expect("tempdir");
        let store = ConfigStore::new(temp.path());
        let mut config = WsConfig::default();
        config.root = "/srv/workspaces".to_string();
        config.adapters.browser = None;
        store.save(&config).expect("save");
        let loaded = store.load().expect("load");
        assert_eq!(loaded.root, "/srv/workspaces");
        assert_eq!(loaded.adapters.get(Category::Browser), None);
        assert_eq!(loaded.adapters.get(Category::Terminal), Some("tmux"));
    }

    #[test]
    fn missing_top_level_keys_take_defaults_but_adapters_table_is_shallow() {
        let temp = TempDir::new().expect("tempdir");
        let store = ConfigStore::new(temp.path());
        fs::write(
            store.config_path(),
            "root = \"/tmp/ws\"\n[adapters]\nterminal = \"zellij\"\n",
        )
        .expect("write");
        let config = store.load().expect("load");
        assert_eq!(config.root, "/tmp/ws");
        assert_eq!(config.preset.as_deref(), Some("macos-default"));
        assert_eq!(config.adapters.get(Category::Terminal), Some("zellij"));
        assert_eq!(config.adapters.get(Category::Browser), None);
        assert_eq!(config.workspace_defaults.status, Status::Active);
    }

    #[test]
    fn blank_adapter_counts_as_unconfigured() {
        let mut config = WsConfig::default();
        config.set_value("adapters.editor", "").expect("set");
        assert_eq!(config.adapters.get(Category::Editor), None);
    }

    #[test]
    fn get_and_set_by_dotted_key() {
        let mut config = WsConfig::default();
        assert_eq!(
            config.get_value("adapters.browser").expect("get"),
            toml::Value::String("chrome-cli".to_string())
        );

        config.set_value("adapters.browser", "brotab").expect("set");
        assert_eq!(config.adapters.browser.as_deref(), Some("brotab"));

        config.set_value("auto_snapshot_minutes", "15").expect("set number");
        assert_eq!(config.auto_snapshot_minutes, 15);

        config
            .set_value("workspace_defaults.tags", "[\"client\",\"rust\"]")
            .expect("set array");
        assert_eq!(config.workspace_defaults.tags, vec!["client", "rust"]);

        config
            .set_value("workspace_defaults.status", "paused")
            .expect("set status");
        assert_eq!(config.workspace_defaults.status, Status::Paused);

        config.set_value("root", "2024").expect("numeric-looking root");
        assert_eq!(config.root, "2024");
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut config = WsConfig::default();
        let err = config.set_value("adapters.printer", "lp").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));

        let err = config.set_value("auto_snapshot_minutes", "soon").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = config.set_value("workspace_defaults.status", "sleeping").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(config, WsConfig::default());
    }

    #[test]
    fn get_unknown_key_fails() {
        let config = WsConfig::default();
        assert!(matches!(
            config.get_value("nope.nothing"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    #[serial]
    fn resolve_root_expands_tilde() {
        let _env = EnvGuard::capture();
        let home = TempDir::new().expect("home");
        std::env::set_var("HOME", home.path());
        let config = WsConfig::default();
        assert_eq!(config.resolve_root(), home.path().join("Workspaces"));

        let mut absolute = WsConfig::default();
        absolute.root = "/opt/ws".to_string();
        assert_eq!(absolute.resolve_root(), PathBuf::from("/opt/ws"));
    }

    #[test]
    #[serial]
    fn config_dir_prefers_env_override_then_home() {
        let _env = EnvGuard::capture();
        let home = TempDir::new().expect("home");
        let custom = TempDir::new().expect("custom");

        std::env::remove_var("WS_CONFIG_DIR");
        std::env::set_var("HOME", home.path());
        assert_eq!(
            resolve_config_dir().expect("dir"),
            home.path().join(".config").join("ws")
        );

        std::env::set_var("WS_CONFIG_DIR", custom.path());
        assert_eq!(resolve_config_dir().expect("dir"), custom.path());
    }
}
