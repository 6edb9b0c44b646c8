use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::WsConfig;
use crate::name::{NameError, WorkspaceName};

pub const MARKER_FILE: &str = ".workspace.yaml";
pub const DOC_FILE: &str = "workspace.md";
pub const TABS_FILE: &str = "tabs.json";
/// Per-workspace state directory; the only dot-directory discovery enters.
pub const STATE_DIR: &str = ".ws";
pub const ARCHIVE_DIR: &str = ".archive";

const SKIPPED_DIRS: [&str; 4] = ["node_modules", "target", "__pycache__", "vendor"];

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Workspace \"{0}\" does not exist")]
    NotFound(String),
    #[error("Workspace \"{name}\" already exists at {}", .path.display())]
    AlreadyExists { name: String, path: PathBuf },
    #[error("Already a workspace: {}", .0.display())]
    AlreadyWorkspace(PathBuf),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("No workspace found at {}", .0.display())]
    NoMarker(PathBuf),
    #[error("Not inside a workspace: {}", .0.display())]
    NotInsideWorkspace(PathBuf),
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to serialize workspace metadata: {0}")]
    Serialize(#[from] serde_yaml::Error),
    #[error("Failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> WorkspaceError + '_ {
    move |source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Paused,
    Archived,
    Abandoned,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Active,
        Status::Paused,
        Status::Archived,
        Status::Abandoned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Paused => "paused",
            Status::Archived => "archived",
            Status::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                format!("unknown status \"{value}\" (expected active, paused, archived or abandoned)")
            })
    }
}

/// Contents of the marker file. Keys this type does not know are kept in
/// `extra` so a read-merge-write never drops hand-added fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceMeta {
    pub name: String,
    pub status: Status,
    pub created: NaiveDate,
    pub last_opened: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl WorkspaceMeta {
    pub fn new(name: &str, status: Status, today: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            status,
            created: today,
            last_opened: today,
            tags: Vec::new(),
            parent: None,
            extra: BTreeMap::new(),
        }
    }

    /// Most recent of `last_opened` and `created`; staleness is measured from it.
    pub fn last_activity(&self) -> NaiveDate {
        self.last_opened.max(self.created)
    }
}

/// Field-wise update applied by [`update_workspace_meta`]; `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaUpdate {
    pub status: Option<Status>,
    pub last_opened: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
    pub parent: Option<Option<String>>,
}

impl MetaUpdate {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn opened(today: NaiveDate) -> Self {
        Self {
            status: Some(Status::Active),
            last_opened: Some(today),
            ..Self::default()
        }
    }

    fn apply(self, meta: &mut WorkspaceMeta) {
        if let Some(status) = self.status {
            meta.status = status;
        }
        if let Some(last_opened) = self.last_opened {
            meta.last_opened = last_opened;
        }
        if let Some(tags) = self.tags {
            meta.tags = tags;
        }
        if let Some(parent) = self.parent {
            meta.parent = parent;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub status: Option<Status>,
    pub tags: Option<Vec<String>>,
    pub parent: Option<WorkspaceName>,
}

#[derive(Debug, Clone)]
pub struct CreatedWorkspace {
    pub name: WorkspaceName,
    pub path: PathBuf,
    pub meta: WorkspaceMeta,
}

/// Files written by [`init_workspace_dir`], in the order they were handled.
#[derive(Debug, Clone)]
pub struct InitializedDir {
    pub path: PathBuf,
    pub meta: WorkspaceMeta,
    pub created: Vec<&'static str>,
    pub kept: Vec<&'static str>,
    pub gitignore_updated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceEntry {
    pub name: WorkspaceName,
    pub path: PathBuf,
    /// `None` when the marker exists but cannot be parsed.
    pub meta: Option<WorkspaceMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkspaceNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<WorkspaceMeta>,
    pub is_workspace: bool,
    pub children: Vec<WorkspaceNode>,
}

impl WorkspaceNode {
    fn group(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn child(&self, name: &str) -> Option<&WorkspaceNode> {
        self.children.iter().find(|child| child.name == name)
    }
}

pub fn marker_path(dir: &Path) -> PathBuf {
    dir.join(MARKER_FILE)
}

pub fn is_workspace_dir(dir: &Path) -> bool {
    marker_path(dir).is_file()
}

/// Read the marker of the workspace at `dir`; `Ok(None)` when there is none.
pub fn read_workspace_meta(dir: &Path) -> Result<Option<WorkspaceMeta>, WorkspaceError> {
    let path = marker_path(dir);
    if !path.is_file() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path).map_err(io_err(&path))?;
    serde_yaml::from_str(&raw)
        .map(Some)
        .map_err(|source| WorkspaceError::Parse { path, source })
}

/// Overwrite the marker file in full.
pub fn write_workspace_meta(dir: &Path, meta: &WorkspaceMeta) -> Result<(), WorkspaceError> {
    let path = marker_path(dir);
    let body = serde_yaml::to_string(meta)?;
    fs::write(&path, body).map_err(io_err(&path))
}

/// Read-merge-write of the marker: fields absent from `update` are written
/// back exactly as read.
pub fn update_workspace_meta(
    dir: &Path,
    update: MetaUpdate,
) -> Result<WorkspaceMeta, WorkspaceError> {
    let mut meta =
        read_workspace_meta(dir)?.ok_or_else(|| WorkspaceError::NoMarker(dir.to_path_buf()))?;
    update.apply(&mut meta);
    write_workspace_meta(dir, &meta)?;
    Ok(meta)
}

pub fn render_workspace_doc(meta: &WorkspaceMeta) -> Result<String, WorkspaceError> {
    let front = serde_yaml::to_string(meta)?;
    Ok(format!(
        "---\n{front}---\n\n# {name}\n\n## Purpose\n\n\n## Notes\n\n\n## Links\n\n",
        front = front,
        name = meta.name
    ))
}

fn write_if_missing(path: &Path, content: &str) -> Result<bool, WorkspaceError> {
    if path.exists() {
        return Ok(false);
    }
    fs::write(path, content).map_err(io_err(path))?;
    Ok(true)
}

const GITIGNORE_ENTRY: &str = ".ws/";

/// Append the state directory to `.gitignore` unless it is already listed.
pub fn ensure_gitignore(dir: &Path) -> Result<bool, WorkspaceError> {
    let path = dir.join(".gitignore");
    let existing = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(io_err(&path)(err)),
    };
    let listed = existing
        .lines()
        .map(str::trim)
        .any(|line| line == GITIGNORE_ENTRY || line == STATE_DIR || line == "/.ws/");
    if listed {
        return Ok(false);
    }
    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str("# workspace session state\n");
    updated.push_str(GITIGNORE_ENTRY);
    updated.push('\n');
    fs::write(&path, updated).map_err(io_err(&path))?;
    Ok(true)
}

/// Turn an existing directory into a workspace. The doc and tab list are
/// only written when absent; the marker goes last, so a failed write never
/// leaves a half-initialized workspace behind.
pub fn init_workspace_dir(
    dir: &Path,
    name: &str,
    tags: Vec<String>,
    today: NaiveDate,
) -> Result<InitializedDir, WorkspaceError> {
    if !dir.is_dir() {
        return Err(WorkspaceError::NotADirectory(dir.to_path_buf()));
    }
    if is_workspace_dir(dir) {
        return Err(WorkspaceError::AlreadyWorkspace(dir.to_path_buf()));
    }

    let mut meta = WorkspaceMeta::new(name, Status::Active, today);
    meta.tags = tags;

    let mut created = Vec::new();
    let mut kept = Vec::new();
    if write_if_missing(&dir.join(DOC_FILE), &render_workspace_doc(&meta)?)? {
        created.push(DOC_FILE);
    } else {
        kept.push(DOC_FILE);
    }
    if write_if_missing(&dir.join(TABS_FILE), "[]\n")? {
        created.push(TABS_FILE);
    } else {
        kept.push(TABS_FILE);
    }
    write_workspace_meta(dir, &meta)?;
    created.push(MARKER_FILE);
    let gitignore_updated = ensure_gitignore(dir)?;

    Ok(InitializedDir {
        path: dir.to_path_buf(),
        meta,
        created,
        kept,
        gitignore_updated,
    })
}

/// The on-disk hierarchy of workspaces under one root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    root: PathBuf,
}

impl WorkspaceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &WsConfig) -> Self {
        Self::new(config.resolve_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn archive_root(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }

    pub fn path_of(&self, name: &WorkspaceName) -> PathBuf {
        name.to_path(&self.root)
    }

    /// Marker presence is the only existence test.
    pub fn exists(&self, name: &WorkspaceName) -> bool {
        is_workspace_dir(&self.path_of(name))
    }

    /// Path of an existing workspace, or `NotFound`.
    pub fn require(&self, name: &WorkspaceName) -> Result<PathBuf, WorkspaceError> {
        if !self.exists(name) {
            return Err(WorkspaceError::NotFound(name.to_string()));
        }
        Ok(self.path_of(name))
    }

    pub fn create(
        &self,
        name: &WorkspaceName,
        options: CreateOptions,
        defaults: &crate::config::WorkspaceDefaults,
        today: NaiveDate,
    ) -> Result<CreatedWorkspace, WorkspaceError> {
        let path = self.path_of(name);
        if is_workspace_dir(&path) {
            return Err(WorkspaceError::AlreadyExists {
                name: name.to_string(),
                path,
            });
        }
        fs::create_dir_all(&path).map_err(io_err(&path))?;

        let mut meta = WorkspaceMeta::new(
            name.leaf(),
            options.status.unwrap_or(defaults.status),
            today,
        );
        meta.tags = options.tags.unwrap_or_else(|| defaults.tags.clone());
        meta.parent = options.parent.map(|parent| parent.to_string());

        write_if_missing(&path.join(DOC_FILE), &render_workspace_doc(&meta)?)?;
        write_if_missing(&path.join(TABS_FILE), "[]\n")?;
        write_workspace_meta(&path, &meta)?;

        Ok(CreatedWorkspace {
            name: name.clone(),
            path,
            meta,
        })
    }

    /// Nearest workspace at or above `dir`, as long as it lies under the root.
    pub fn workspace_containing(&self, dir: &Path) -> Option<WorkspaceName> {
        let root = self.root.canonicalize().unwrap_or_else(|_| self.root.clone());
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        dir.ancestors()
            .take_while(|candidate| *candidate != root.as_path() && candidate.starts_with(&root))
            .find(|candidate| is_workspace_dir(candidate))
            .and_then(|candidate| WorkspaceName::from_relative_path(&root, candidate))
    }

    /// Every workspace under the root, sorted by name.
    pub fn find_all(&self) -> Vec<WorkspaceEntry> {
        let mut entries = Vec::new();
        if !self.root.is_dir() {
            return entries;
        }
        let mut visited = HashSet::new();
        walk_for_workspaces(&self.root, &self.root, &mut visited, &mut entries);
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub fn tree(&self) -> WorkspaceNode {
        build_workspace_tree(&self.find_all())
    }
}

fn walk_for_workspaces(
    dir: &Path,
    root: &Path,
    visited: &mut HashSet<PathBuf>,
    results: &mut Vec<WorkspaceEntry>,
) {
    let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    if !visited.insert(canonical) {
        return;
    }

    if dir != root && is_workspace_dir(dir) {
        if let Some(name) = WorkspaceName::from_relative_path(root, dir) {
            let meta = match read_workspace_meta(dir) {
                Ok(meta) => meta,
                Err(err) => {
                    warn!(path = %dir.display(), %err, "unreadable workspace marker");
                    None
                }
            };
            results.push(WorkspaceEntry {
                name,
                path: dir.to_path_buf(),
                meta,
            });
        }
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        // Follows symlinks so linked-in directories are discovered.
        if !path.is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if file_name.starts_with('.') && file_name != STATE_DIR {
            continue;
        }
        if SKIPPED_DIRS.contains(&file_name) {
            continue;
        }
        walk_for_workspaces(&path, root, visited, results);
    }
}

/// Fold a flat workspace list into a hierarchy keyed by name segments.
/// Segments that are not workspaces themselves become bare grouping nodes.
pub fn build_workspace_tree(entries: &[WorkspaceEntry]) -> WorkspaceNode {
    let mut root = WorkspaceNode::group("root");
    for entry in entries {
        let mut node = &mut root;
        for segment in entry.name.segments() {
            let index = match node.children.iter().position(|c| &c.name == segment) {
                Some(index) => index,
                None => {
                    node.children.push(WorkspaceNode::group(segment));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }
        node.is_workspace = true;
        node.path = Some(entry.path.clone());
        node.meta = entry.meta.clone();
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkspaceDefaults;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn name(raw: &str) -> WorkspaceName {
        WorkspaceName::parse(raw).expect("name")
    }

    #[test]
    fn create_writes_marker_doc_and_empty_tabs() {
        let temp = TempDir::new().expect("tempdir");
        let store = WorkspaceStore::new(temp.path());
        let created = store
            .create(
                &name("client.api"),
                CreateOptions {
                    tags: Some(vec!["rust".to_string()]),
                    parent: Some(name("client")),
                    ..CreateOptions::default()
                },
                &WorkspaceDefaults::default(),
                day(2026, 3, 1),
            )
            .expect("create");

        assert_eq!(created.path, temp.path().join("client").join("api"));
        assert_eq!(created.meta.name, "api");
        assert_eq!(created.meta.parent.as_deref(), Some("client"));
        let tabs = fs::read_to_string(created.path.join(TABS_FILE)).expect("tabs");
        assert_eq!(tabs, "[]\n");
        let doc = fs::read_to_string(created.path.join(DOC_FILE)).expect("doc");
        assert!(doc.starts_with("---\nname: api\n"));
        assert!(doc.contains("\n---\n\n# api\n\n## Purpose"));
        assert!(doc.contains("## Links"));

        let marker = fs::read_to_string(marker_path(&created.path)).expect("marker");
        assert!(marker.contains("status: active"));
        assert!(marker.contains("created: 2026-03-01"));
    }

    #[test]
    fn create_keeps_existing_doc() {
        let temp = TempDir::new().expect("tempdir");
        let store = WorkspaceStore::new(temp.path());
        let dir = temp.path().join("notes");
        fs::create_dir_all(&dir).expect("dir");
        fs::write(dir.join(DOC_FILE), "# mine\n").expect("doc");

        store
            .create(
                &name("notes"),
                CreateOptions::default(),
                &WorkspaceDefaults::default(),
                day(2026, 1, 1),
            )
            .expect("create");
        assert_eq!(
            fs::read_to_string(dir.join(DOC_FILE)).expect("doc"),
            "# mine\n"
        );
    }

    #[test]
    fn create_applies_config_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let store = WorkspaceStore::new(temp.path());
        let defaults = WorkspaceDefaults {
            status: Status::Paused,
            tags: vec!["inbox".to_string()],
        };
        let created = store
            .create(&name("later"), CreateOptions::default(), &defaults, day(2026, 1, 1))
            .expect("create");
        assert_eq!(created.meta.status, Status::Paused);
        assert_eq!(created.meta.tags, vec!["inbox".to_string()]);
    }

    #[test]
    fn update_preserves_unknown_keys() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(
            marker_path(temp.path()),
            "name: demo\nstatus: active\ncreated: 2026-01-01\nlast_opened: 2026-01-02\ntags: []\nparent: null\nowner: sam\n",
        )
        .expect("marker");

        let meta = update_workspace_meta(temp.path(), MetaUpdate::status(Status::Paused))
            .expect("update");
        assert_eq!(meta.status, Status::Paused);
        let raw = fs::read_to_string(marker_path(temp.path())).expect("marker");
        assert!(raw.contains("owner: sam"));
        assert!(raw.contains("last_opened: 2026-01-02"));
    }

    #[test]
    fn update_without_marker_fails() {
        let temp = TempDir::new().expect("tempdir");
        let err = update_workspace_meta(temp.path(), MetaUpdate::default()).unwrap_err();
        assert!(matches!(err, WorkspaceError::NoMarker(_)));
    }

    #[test]
    fn init_never_overwrites_existing_files() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(temp.path().join(DOC_FILE), "# keep\n").expect("doc");
        fs::write(temp.path().join(TABS_FILE), "[{\"title\":\"a\",\"url\":\"b\"}]").expect("tabs");
        fs::write(temp.path().join(".gitignore"), "target").expect("gitignore");

        let result = init_workspace_dir(temp.path(), "legacy", Vec::new(), day(2026, 2, 2))
            .expect("init");
        assert_eq!(result.created, vec![MARKER_FILE]);
        assert_eq!(result.kept, vec![DOC_FILE, TABS_FILE]);
        assert!(result.gitignore_updated);
        assert_eq!(
            fs::read_to_string(temp.path().join(DOC_FILE)).expect("doc"),
            "# keep\n"
        );
        let gitignore = fs::read_to_string(temp.path().join(".gitignore")).expect("gitignore");
        assert!(gitignore.starts_with("target\n"));
        assert!(gitignore.ends_with(".ws/\n"));

        let again = init_workspace_dir(temp.path(), "legacy", Vec::new(), day(2026, 2, 2));
        assert!(matches!(again, Err(WorkspaceError::AlreadyWorkspace(_))));
        assert!(!ensure_gitignore(temp.path()).expect("gitignore"));
    }

    #[test]
    fn init_lists_marker_after_doc_and_tabs() {
        let temp = TempDir::new().expect("tempdir");
        let result = init_workspace_dir(temp.path(), "fresh", Vec::new(), day(2026, 2, 2))
            .expect("init");
        assert_eq!(result.created, vec![DOC_FILE, TABS_FILE, MARKER_FILE]);
        assert!(result.kept.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn failed_tabs_write_leaves_no_marker() {
        let temp = TempDir::new().expect("tempdir");
        std::os::unix::fs::symlink(temp.path().join("gone/tabs.json"), temp.path().join(TABS_FILE))
            .expect("dangling link");

        let err = init_workspace_dir(temp.path(), "broken", Vec::new(), day(2026, 2, 2));
        assert!(matches!(err, Err(WorkspaceError::Io { .. })));
        assert!(!is_workspace_dir(temp.path()));

        let store = WorkspaceStore::new(temp.path().join("root"));
        let name = WorkspaceName::parse("half").expect("name");
        let dir = store.path_of(&name);
        fs::create_dir_all(&dir).expect("dir");
        std::os::unix::fs::symlink(temp.path().join("gone/doc.md"), dir.join(DOC_FILE))
            .expect("dangling link");
        let created = store.create(
            &name,
            CreateOptions::default(),
            &WorkspaceDefaults::default(),
            day(2026, 2, 2),
        );
        assert!(created.is_err());
        assert!(!store.exists(&name));
    }

    #[test]
    fn init_rejects_files() {
        let temp = TempDir::new().expect("tempdir");
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").expect("file");
        let err = init_workspace_dir(&file, "plain", Vec::new(), day(2026, 1, 1)).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotADirectory(_)));
    }

    #[test]
    fn find_all_skips_hidden_and_dependency_dirs() {
        let temp = TempDir::new().expect("tempdir");
        let store = WorkspaceStore::new(temp.path());
        let defaults = WorkspaceDefaults::default();
        for raw in ["a", "a.b", "c"] {
            store
                .create(&name(raw), CreateOptions::default(), &defaults, day(2026, 1, 1))
                .expect("create");
        }
        for hidden in [".archive/old", "c/node_modules/pkg", ".cache/x"] {
            let dir = temp.path().join(hidden);
            fs::create_dir_all(&dir).expect("dir");
            fs::write(marker_path(&dir), "name: hidden\n").expect("marker");
        }

        let names: Vec<String> = store
            .find_all()
            .into_iter()
            .map(|entry| entry.name.to_string())
            .collect();
        assert_eq!(names, vec!["a", "a/b", "c"]);
    }

    #[test]
    fn corrupt_marker_still_counts_as_workspace() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("broken");
        fs::create_dir_all(&dir).expect("dir");
        fs::write(marker_path(&dir), ":: not yaml ::\n- [").expect("marker");

        let store = WorkspaceStore::new(temp.path());
        assert!(store.exists(&name("broken")));
        let all = store.find_all();
        assert_eq!(all.len(), 1);
        assert!(all[0].meta.is_none());
    }

    #[test]
    fn tree_groups_intermediate_segments() {
        let temp = TempDir::new().expect("tempdir");
        let store = WorkspaceStore::new(temp.path());
        let defaults = WorkspaceDefaults::default();
        for raw in ["org.team.svc", "org.team.web", "solo"] {
            store
                .create(&name(raw), CreateOptions::default(), &defaults, day(2026, 1, 1))
                .expect("create");
        }

        let tree = store.tree();
        assert_eq!(tree.children.len(), 2);
        let org = tree.child("org").expect("org");
        assert!(!org.is_workspace);
        assert!(org.meta.is_none());
        let team = org.child("team").expect("team");
        assert_eq!(team.children.len(), 2);
        assert!(team.child("svc").expect("svc").is_workspace);
        assert!(tree.child("solo").expect("solo").meta.is_some());
    }

    #[test]
    fn workspace_containing_walks_up_to_marker() {
        let temp = TempDir::new().expect("tempdir");
        let store = WorkspaceStore::new(temp.path());
        store
            .create(
                &name("proj"),
                CreateOptions::default(),
                &WorkspaceDefaults::default(),
                day(2026, 1, 1),
            )
            .expect("create");
        let nested = temp.path().join("proj").join("src").join("deep");
        fs::create_dir_all(&nested).expect("nested");

        assert_eq!(
            store.workspace_containing(&nested).map(|n| n.to_string()),
            Some("proj".to_string())
        );
        assert!(store.workspace_containing(temp.path()).is_none());
    }
}
