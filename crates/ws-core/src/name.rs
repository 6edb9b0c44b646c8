use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Workspace name is required")]
    Empty,
    #[error("Workspace name \"{name}\" has an invalid segment \"{segment}\"")]
    InvalidSegment { name: String, segment: String },
}

/// Workspace identifier as an ordered list of path segments under the root.
///
/// Parsed from either `client.project` or `client/project`; rendered with `/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkspaceName {
    segments: Vec<String>,
}

impl WorkspaceName {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        let segments = trimmed
            .split(['.', '/'])
            .map(|segment| segment.trim().to_string())
            .collect::<Vec<_>>();
        Self::from_segments(segments).map_err(|err| match err {
            NameError::InvalidSegment { segment, .. } => NameError::InvalidSegment {
                name: trimmed.to_string(),
                segment,
            },
            other => other,
        })
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(NameError::Empty);
        }
        let joined = segments.join("/");
        for segment in &segments {
            if !is_valid_segment(segment) {
                return Err(NameError::InvalidSegment {
                    name: joined,
                    segment: segment.clone(),
                });
            }
        }
        Ok(Self { segments })
    }

    /// Name of the workspace directory relative to `root`, if it lives there.
    pub fn from_relative_path(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let segments = relative
            .components()
            .map(|component| component.as_os_str().to_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?;
        Self::from_segments(segments).ok()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn join(&self, child: &WorkspaceName) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(child.segments.iter().cloned());
        Self { segments }
    }

    pub fn to_path(&self, root: &Path) -> PathBuf {
        self.segments
            .iter()
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    }

    /// Identifier safe for terminal multiplexers: tmux reads `.` and `:` in a
    /// target as window and pane separators.
    pub fn session_id(&self) -> String {
        self.segments.join("-").replace(['.', ':'], "_")
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.starts_with('.')
        && !segment.contains(['/', '\\', '\0'])
}

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for WorkspaceName {
    type Err = NameError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl Serialize for WorkspaceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkspaceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
