//! Command orchestrators: create, init, open, close, snapshot and archive.
//!
//! Each one checks its preconditions, mutates the workspace store and then
//! drives the configured adapters, recording one [`Step`](crate::step::Step)
//! per adapter call. Only store errors and unknown adapter names are fatal.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::info;

use crate::adapters::{
    checked, BrowserAdapter, EditorAdapter, Registry, RegistryError, SessionCreate, TasksAdapter,
    TasksInit, TerminalAdapter,
};
use crate::config::WsConfig;
use crate::exec::{self, RunOptions};
use crate::name::{NameError, WorkspaceName};
use crate::session::{
    append_tabs_history, clear_session, read_session, read_tabs, write_session, write_tabs,
    SessionRecord,
};
use crate::step::Report;
use crate::workspace::{
    init_workspace_dir, update_workspace_meta, CreateOptions, MetaUpdate, Status, WorkspaceError,
    WorkspaceStore,
};

const NOT_CONFIGURED: &str = "no adapter configured";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Name(#[from] NameError),
}

/// Everything an orchestrator needs, loaded once per invocation.
pub struct Context<'a> {
    config: &'a WsConfig,
    registry: &'a Registry,
    store: WorkspaceStore,
    today: NaiveDate,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a WsConfig, registry: &'a Registry) -> Self {
        Self {
            config,
            registry,
            store: WorkspaceStore::from_config(config),
            today: Local::now().date_naive(),
        }
    }

    pub fn with_store(mut self, store: WorkspaceStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &WsConfig {
        self.config
    }

    pub fn store(&self) -> &WorkspaceStore {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    fn adapters(&self) -> Result<Adapters<'a>, RegistryError> {
        Ok(Adapters {
            browser: self.registry.browser_for(self.config)?,
            tasks: self.registry.tasks_for(self.config)?,
            terminal: self.registry.terminal_for(self.config)?,
            editor: self.registry.editor_for(self.config)?,
        })
    }
}

/// The configured adapter of every category, resolved before a command
/// touches the store so an unknown name aborts with nothing written.
struct Adapters<'a> {
    browser: Option<&'a dyn BrowserAdapter>,
    tasks: Option<&'a dyn TasksAdapter>,
    terminal: Option<&'a dyn TerminalAdapter>,
    editor: Option<&'a dyn EditorAdapter>,
}

fn label(category: &str, adapter: &str) -> String {
    format!("{category} ({adapter})")
}

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: WorkspaceName,
    /// Create `name` underneath this existing workspace.
    pub parent: Option<WorkspaceName>,
    /// Falls back to the configured workspace defaults.
    pub tags: Option<Vec<String>>,
    pub tasks: bool,
    pub terminal: bool,
    pub git: bool,
}

impl CreateRequest {
    pub fn new(name: WorkspaceName) -> Self {
        Self {
            name,
            parent: None,
            tags: None,
            tasks: true,
            terminal: true,
            git: true,
        }
    }
}

pub fn create(ctx: &Context<'_>, request: CreateRequest) -> Result<Report, CommandError> {
    let full_name = match &request.parent {
        Some(parent) => {
            ctx.store.require(parent)?;
            parent.join(&request.name)
        }
        None => request.name.clone(),
    };
    if ctx.store.exists(&full_name) {
        return Err(WorkspaceError::AlreadyExists {
            name: full_name.to_string(),
            path: ctx.store.path_of(&full_name),
        }
        .into());
    }
    let adapters = ctx.adapters()?;

    let created = ctx.store.create(
        &full_name,
        CreateOptions {
            status: None,
            tags: request.tags,
            parent: request.parent,
        },
        &ctx.config.workspace_defaults,
        ctx.today,
    )?;
    info!(workspace = %full_name, path = %created.path.display(), "created workspace");

    let mut report = Report::new(full_name.to_string(), &created.path);
    report.ok("Directory", created.path.display().to_string());
    report.ok("Status", created.meta.status.to_string());
    if !created.meta.tags.is_empty() {
        report.ok("Tags", created.meta.tags.join(", "));
    }
    if let Some(parent) = created.meta.parent.as_deref() {
        report.ok("Parent", parent);
    }

    if request.tasks {
        init_tasks(adapters.tasks, &mut report, &created.path);
    }
    if request.terminal {
        ensure_terminal(adapters.terminal, &mut report, &full_name.session_id(), &created.path);
    }
    if request.git {
        init_git(&mut report, &created.path);
    }
    Ok(report)
}

#[derive(Debug, Clone)]
pub struct InitRequest {
    pub dir: PathBuf,
    /// Defaults to the directory's own name.
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub tasks: bool,
    pub terminal: bool,
    /// Symlink the directory into the root when it lives outside it.
    pub link: bool,
}

impl InitRequest {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            name: None,
            tags: Vec::new(),
            tasks: true,
            terminal: true,
            link: false,
        }
    }
}

/// Adopt an existing directory as a workspace. Pre-existing files other than
/// the marker are never overwritten.
pub fn init(ctx: &Context<'_>, request: InitRequest) -> Result<Report, CommandError> {
    let dir = request
        .dir
        .canonicalize()
        .map_err(|_| WorkspaceError::NotADirectory(request.dir.clone()))?;
    let raw_name = match request.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let name = WorkspaceName::from_segments([raw_name.as_str()])?;
    let adapters = ctx.adapters()?;

    let initialized = init_workspace_dir(&dir, name.leaf(), request.tags, ctx.today)?;
    info!(path = %dir.display(), "initialized workspace");

    let mut report = Report::new(name.to_string(), &dir);
    for file in &initialized.created {
        report.ok("Created", *file);
    }
    for file in &initialized.kept {
        report.skipped("Kept", format!("{file} already exists"));
    }
    if initialized.gitignore_updated {
        report.ok("Gitignore", ".ws/ added");
    }

    if request.tasks {
        init_tasks(adapters.tasks, &mut report, &dir);
    }
    if request.terminal {
        ensure_terminal(adapters.terminal, &mut report, &name.session_id(), &dir);
    }

    let root = ctx.store.root();
    let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    if !dir.starts_with(&canonical_root) {
        if request.link {
            link_into_root(&mut report, root, &name, &dir);
        } else {
            report.warn(
                "Root",
                format!(
                    "outside the workspaces root ({}); run `ws init --path {} --link` to list it",
                    root.display(),
                    dir.display()
                ),
            );
        }
    }
    Ok(report)
}

fn link_into_root(report: &mut Report, root: &Path, name: &WorkspaceName, target: &Path) {
    let link = name.to_path(root);
    if link.symlink_metadata().is_ok() {
        report.skipped("Link", format!("{} already exists", link.display()));
        return;
    }
    let result = fs::create_dir_all(root).and_then(|_| symlink_dir(target, &link));
    match result {
        Ok(()) => report.ok("Link", format!("{} -> {}", link.display(), target.display())),
        Err(err) => report.failed("Link", err.to_string()),
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub name: WorkspaceName,
    pub browser: bool,
    pub terminal: bool,
    pub editor: bool,
    /// Hand the terminal over to the session once everything else ran.
    pub attach: bool,
}

impl OpenRequest {
    pub fn new(name: WorkspaceName) -> Self {
        Self {
            name,
            browser: true,
            terminal: true,
            editor: true,
            attach: false,
        }
    }
}

pub fn open(ctx: &Context<'_>, request: OpenRequest) -> Result<Report, CommandError> {
    let path = ctx.store.require(&request.name)?;
    let adapters = ctx.adapters()?;
    let mut report = Report::new(request.name.to_string(), &path);

    let meta = update_workspace_meta(&path, MetaUpdate::opened(ctx.today))?;
    report.ok("Status", format!("{}, last opened {}", meta.status, meta.last_opened));

    let session_id = request.name.session_id();
    let mut session = SessionRecord::opened_now();

    if request.terminal {
        ensure_terminal(adapters.terminal, &mut report, &session_id, &path);
    }

    if request.browser {
        match adapters.browser {
            None => report.skipped("Browser", NOT_CONFIGURED),
            Some(browser) => {
                let step = label("Browser", browser.name());
                let tabs = read_tabs(&path);
                if tabs.is_empty() {
                    report.skipped(step, "no saved tabs");
                } else {
                    let total = tabs.len();
                    let opened = report.record(step, browser.open_tabs(&tabs, None), |opened| {
                        match opened.window_id.as_deref() {
                            Some(window) => format!(
                                "restored {}/{total} tabs, tracking window {window}",
                                opened.opened
                            ),
                            None => format!("restored {}/{total} tabs", opened.opened),
                        }
                    });
                    session.browser_window_id = opened.and_then(|opened| opened.window_id);
                }
            }
        }
    }

    write_session(&path, &session)?;

    if request.editor {
        match adapters.editor {
            None => report.skipped("Editor", NOT_CONFIGURED),
            Some(editor) => {
                report.record(label("Editor", editor.name()), editor.open(&path), |_| {
                    "opened".to_string()
                });
            }
        }
    }

    if let Some(tasks) = adapters.tasks {
        if let Some(summary) = tasks.summary(&path) {
            let lines: Vec<&str> = summary.lines().filter(|l| !l.trim().is_empty()).collect();
            let detail = match lines.as_slice() {
                [single] => single.trim().to_string(),
                many => format!("{} items", many.len()),
            };
            report.ok(label("Tasks", tasks.name()), detail);
        }
    }

    if request.attach {
        match adapters.terminal {
            None => report.skipped("Attach", NOT_CONFIGURED),
            Some(terminal) => {
                report.record(
                    label("Attach", terminal.name()),
                    terminal.attach_session(&session_id),
                    |_| format!("detached from \"{session_id}\""),
                );
            }
        }
    }

    info!(workspace = %request.name, "opened workspace");
    Ok(report)
}

#[derive(Debug, Clone)]
pub struct CloseRequest {
    /// Inferred from `cwd` when absent.
    pub name: Option<WorkspaceName>,
    pub cwd: PathBuf,
    pub browser: bool,
}

impl CloseRequest {
    pub fn new(name: Option<WorkspaceName>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            name,
            cwd: cwd.into(),
            browser: true,
        }
    }
}

pub fn close(ctx: &Context<'_>, request: CloseRequest) -> Result<Report, CommandError> {
    let name = match request.name {
        Some(name) => name,
        None => ctx
            .store
            .workspace_containing(&request.cwd)
            .ok_or_else(|| WorkspaceError::NotInsideWorkspace(request.cwd.clone()))?,
    };
    let path = ctx.store.require(&name)?;
    let adapters = ctx.adapters()?;
    let mut report = Report::new(name.to_string(), &path);

    if request.browser {
        capture_tabs(adapters.browser, &mut report, &path)?;
    }

    clear_session(&path)?;
    let meta = update_workspace_meta(&path, MetaUpdate::status(Status::Paused))?;
    report.ok("Status", meta.status.to_string());

    info!(workspace = %name, "closed workspace");
    Ok(report)
}

/// Capture the current tabs without closing anything.
pub fn snapshot(ctx: &Context<'_>, name: &WorkspaceName) -> Result<Report, CommandError> {
    let path = ctx.store.require(name)?;
    let adapters = ctx.adapters()?;
    let mut report = Report::new(name.to_string(), &path);
    capture_tabs(adapters.browser, &mut report, &path)?;
    Ok(report)
}

fn capture_tabs(
    browser: Option<&dyn BrowserAdapter>,
    report: &mut Report,
    path: &Path,
) -> Result<(), CommandError> {
    let Some(browser) = browser else {
        report.skipped("Browser", NOT_CONFIGURED);
        return Ok(());
    };
    let step = label("Browser", browser.name());

    let window = read_session(path).and_then(|session| session.browser_window_id);
    match window.as_deref() {
        Some(window) if browser.supports_windows() => {
            report.ok(step.clone(), format!("capturing from tracked window {window}"))
        }
        _ => report.warn(
            step.clone(),
            "no tracked window; capturing tabs from every window (may include other workspaces)",
        ),
    }

    let tabs = match browser.list_tabs(window.as_deref()) {
        Ok(tabs) => tabs,
        Err(err) => {
            report.failed(step, err.to_string());
            return Ok(());
        }
    };
    if tabs.is_empty() {
        report.skipped(step, "no tabs to save");
        return Ok(());
    }

    write_tabs(path, &tabs)?;
    append_tabs_history(path, &tabs)?;
    report.ok(step, format!("saved {} tabs (last session + history)", tabs.len()));
    Ok(())
}

pub fn archive(ctx: &Context<'_>, name: &WorkspaceName) -> Result<Report, CommandError> {
    let path = ctx.store.require(name)?;
    let adapters = ctx.adapters()?;
    let mut report = Report::new(name.to_string(), &path);

    if let Some(terminal) = adapters.terminal {
        let session_id = name.session_id();
        if terminal.session_exists(&session_id) {
            report.record(
                label("Terminal", terminal.name()),
                terminal.kill_session(&session_id),
                |_| format!("killed session \"{session_id}\""),
            );
        }
    }

    update_workspace_meta(&path, MetaUpdate::status(Status::Archived))?;
    let archived = ctx.store.move_to_archive(name)?;
    let detail = if archived.merged {
        format!("{} (merged)", archived.destination.display())
    } else {
        archived.destination.display().to_string()
    };
    report.ok("Archive", detail);

    info!(workspace = %name, destination = %archived.destination.display(), "archived workspace");
    Ok(report)
}

fn init_tasks(tasks: Option<&dyn TasksAdapter>, report: &mut Report, dir: &Path) {
    match tasks {
        None => report.skipped("Tasks", NOT_CONFIGURED),
        Some(tasks) => {
            report.record(label("Tasks", tasks.name()), tasks.init(dir), |init| {
                let detail = match init {
                    TasksInit::Initialized => "initialized",
                    TasksInit::AlreadyInitialized => "already initialized",
                };
                detail.to_string()
            });
        }
    }
}

fn ensure_terminal(
    terminal: Option<&dyn TerminalAdapter>,
    report: &mut Report,
    session: &str,
    dir: &Path,
) {
    let Some(terminal) = terminal else {
        report.skipped("Terminal", NOT_CONFIGURED);
        return;
    };
    report.record(
        label("Terminal", terminal.name()),
        terminal.create_session(session, dir),
        |created| match created {
            SessionCreate::Created => format!("session \"{session}\" created"),
            SessionCreate::AlreadyExisted => format!("session \"{session}\" exists"),
        },
    );
}

fn init_git(report: &mut Report, dir: &Path) {
    let options = RunOptions::in_dir(dir);
    if exec::run("git", ["rev-parse", "--git-dir"], &options).ok {
        report.skipped("Git", "already inside a repository");
        return;
    }
    if !exec::is_installed("git") {
        report.skipped("Git", "git is not installed");
        return;
    }
    let output = exec::run("git", ["init"], &options);
    report.record("Git", checked(output, "git", "init"), |_| "initialized".to_string());
}
