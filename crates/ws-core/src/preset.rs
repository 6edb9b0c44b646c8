use std::collections::BTreeMap;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::config::{AdapterSelection, ConfigError, ConfigStore, WsConfig};

const BUILTIN_PRESETS: &[(&str, &str)] = &[
    ("macos-default", include_str!("../presets/macos-default.toml")),
    ("linux-default", include_str!("../presets/linux-default.toml")),
    ("vscode-zellij", include_str!("../presets/vscode-zellij.toml")),
];

/// Named bundle of overrides applied on top of the current configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub adapters: AdapterSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetSource {
    BuiltIn,
    User,
}

impl PresetSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PresetSource::BuiltIn => "built-in",
            PresetSource::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub source: PresetSource,
}

fn parse_preset(text: &str, origin: &str) -> Result<Preset, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::PresetParse {
        path: origin.to_string(),
        source,
    })
}

fn is_valid_preset_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}

impl ConfigStore {
    /// User presets shadow built-in ones of the same name.
    pub fn load_preset(&self, name: &str) -> Result<(Preset, PresetSource), ConfigError> {
        let name = name.trim();
        if !is_valid_preset_name(name) {
            return Err(ConfigError::PresetNotFound(name.to_string()));
        }
        let user_path = self.presets_dir().join(format!("{name}.toml"));
        if user_path.is_file() {
            let text = fs::read_to_string(&user_path)?;
            let preset = parse_preset(&text, &user_path.display().to_string())?;
            return Ok((preset, PresetSource::User));
        }
        let (_, text) = BUILTIN_PRESETS
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))?;
        let preset = parse_preset(text, &format!("built-in preset {name}"))?;
        Ok((preset, PresetSource::BuiltIn))
    }

    /// Every available preset sorted by name, with shadowed built-ins omitted.
    pub fn list_presets(&self) -> Result<Vec<PresetInfo>, ConfigError> {
        let mut presets = BTreeMap::new();
        for (name, text) in BUILTIN_PRESETS {
            let preset = parse_preset(text, &format!("built-in preset {name}"))?;
            presets.insert(
                name.to_string(),
                PresetInfo {
                    name: name.to_string(),
                    description: preset.description,
                    source: PresetSource::BuiltIn,
                },
            );
        }

        let dir = self.presets_dir();
        if dir.is_dir() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                    continue;
                };
                let text = fs::read_to_string(&path)?;
                let preset = parse_preset(&text, &path.display().to_string())?;
                presets.insert(
                    name.to_string(),
                    PresetInfo {
                        name: name.to_string(),
                        description: preset.description,
                        source: PresetSource::User,
                    },
                );
            }
        }
        Ok(presets.into_values().collect())
    }

    /// Overlay a preset onto `config`: records its name, merges its adapter
    /// map and replaces `root` when the preset names one. Does not save.
    pub fn apply_preset(&self, config: &mut WsConfig, name: &str) -> Result<Preset, ConfigError> {
        let (preset, _) = self.load_preset(name)?;
        config.preset = Some(name.trim().to_string());
        config.adapters.merge(&preset.adapters);
        if let Some(root) = preset.root.as_deref().filter(|root| !root.trim().is_empty()) {
            config.root = root.to_string();
        }
        Ok(preset)
    }
}
