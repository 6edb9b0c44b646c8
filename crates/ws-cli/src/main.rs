use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use ws_core::adapters::Registry;
use ws_core::config::{ConfigStore, WsConfig};
use ws_core::lifecycle::{
    self, CloseRequest, Context, CreateRequest, InitRequest, OpenRequest,
};
use ws_core::listing::{list_workspaces, ListFilter};
use ws_core::name::WorkspaceName;
use ws_core::setup::setup;
use ws_core::step::Report;
use ws_core::workspace::Status;
use ws_render::{
    json, render_adapters, render_list, render_presets, render_report, render_setup,
    render_tree,
};

#[derive(Debug, Parser)]
#[command(
    name = "ws",
    version,
    about = "Workspace manager: project directories with their tabs, tasks, terminals and editors",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the workspaces root and check that configured tools are installed.
    Setup {
        /// Report without creating anything.
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        json: bool,
    },
    /// Create a new workspace under the root.
    Create {
        name: WorkspaceName,
        /// Create as a sub-workspace of an existing workspace.
        #[arg(long, value_name = "WORKSPACE")]
        parent: Option<WorkspaceName>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        no_tasks: bool,
        #[arg(long)]
        no_terminal: bool,
        #[arg(long)]
        no_git: bool,
        #[arg(long)]
        json: bool,
    },
    /// Turn an existing directory into a workspace.
    Init {
        /// Directory to adopt; defaults to the current directory.
        #[arg(long)]
        path: Option<PathBuf>,
        /// Workspace name; defaults to the directory name.
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        no_tasks: bool,
        #[arg(long)]
        no_terminal: bool,
        /// Symlink the directory into the root when it lives elsewhere.
        #[arg(long)]
        link: bool,
        #[arg(long)]
        json: bool,
    },
    /// Open a workspace: terminal session, saved tabs, editor.
    Open {
        name: WorkspaceName,
        #[arg(long)]
        no_browser: bool,
        #[arg(long)]
        no_terminal: bool,
        #[arg(long)]
        no_editor: bool,
        /// Attach to the terminal session afterwards.
        #[arg(long)]
        attach: bool,
        #[arg(long)]
        json: bool,
    },
    /// Save the workspace's tabs and mark it paused.
    Close {
        /// Defaults to the workspace containing the current directory.
        name: Option<WorkspaceName>,
        #[arg(long)]
        no_browser: bool,
        #[arg(long)]
        json: bool,
    },
    /// Capture the workspace's tabs without closing it.
    Snapshot {
        name: WorkspaceName,
        #[arg(long)]
        json: bool,
    },
    /// List workspaces.
    List {
        #[arg(long)]
        status: Option<Status>,
        /// Only workspaces not opened in more than this many days.
        #[arg(long, value_name = "DAYS")]
        stale: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Show workspaces as a tree.
    Tree {
        #[arg(long)]
        json: bool,
    },
    /// Inspect or change configuration: show, get, set, preset, adapters.
    Config {
        action: String,
        key: Option<String>,
        value: Option<String>,
    },
    /// Kill the terminal session and move the workspace under .archive.
    Archive {
        name: WorkspaceName,
        #[arg(long)]
        json: bool,
    },
    /// Print the version.
    Version,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(std::env::var("WS_LOG").unwrap_or_else(|_| "warn".to_string()))
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    if let Command::Version = cli.command {
        println!("ws {}", ws_core::version());
        return Ok(());
    }
    let store = ConfigStore::from_env()?;
    let config = store.load().context("loading configuration")?;
    debug!(path = %store.config_path().display(), root = %config.root, "loaded configuration");
    let registry = Registry::builtin();
    let ctx = Context::new(&config, &registry);

    match cli.command {
        Command::Setup { dry_run, json: as_json } => {
            let report = setup(&config, &registry, dry_run)?;
            if as_json {
                println!("{}", json(&report)?);
            } else {
                print!("{}", render_setup(&report, dry_run));
            }
        }
        Command::Create {
            name,
            parent,
            tags,
            no_tasks,
            no_terminal,
            no_git,
            json: as_json,
        } => {
            let mut request = CreateRequest::new(name);
            request.parent = parent;
            request.tags = tags;
            request.tasks = !no_tasks;
            request.terminal = !no_terminal;
            request.git = !no_git;
            let report = lifecycle::create(&ctx, request)?;
            emit("Creating workspace", &report, as_json)?;
            if !as_json {
                println!("\nWorkspace \"{0}\" created. Open with: ws open {0}", report.workspace);
            }
        }
        Command::Init {
            path,
            name,
            tags,
            no_tasks,
            no_terminal,
            link,
            json: as_json,
        } => {
            let dir = match path {
                Some(path) => path,
                None => std::env::current_dir().context("resolving current directory")?,
            };
            let mut request = InitRequest::new(dir);
            request.name = name;
            request.tags = tags;
            request.tasks = !no_tasks;
            request.terminal = !no_terminal;
            request.link = link;
            let report = lifecycle::init(&ctx, request)?;
            emit("Initializing workspace", &report, as_json)?;
        }
        Command::Open {
            name,
            no_browser,
            no_terminal,
            no_editor,
            attach,
            json: as_json,
        } => {
            let mut request = OpenRequest::new(name);
            request.browser = !no_browser;
            request.terminal = !no_terminal;
            request.editor = !no_editor;
            request.attach = attach;
            let report = lifecycle::open(&ctx, request)?;
            emit("Opening workspace", &report, as_json)?;
        }
        Command::Close {
            name,
            no_browser,
            json: as_json,
        } => {
            let cwd = std::env::current_dir().context("resolving current directory")?;
            let mut request = CloseRequest::new(name, cwd);
            request.browser = !no_browser;
            let report = lifecycle::close(&ctx, request)?;
            emit("Closing workspace", &report, as_json)?;
            if !as_json {
                println!("\nResume with: ws open {}", report.workspace);
            }
        }
        Command::Snapshot { name, json: as_json } => {
            let report = lifecycle::snapshot(&ctx, &name)?;
            emit("Snapshot", &report, as_json)?;
        }
        Command::List {
            status,
            stale,
            json: as_json,
        } => {
            let filter = ListFilter {
                status,
                stale_days: stale,
            };
            let entries = list_workspaces(ctx.store(), &filter, ctx.today());
            if as_json {
                println!("{}", json(&entries)?);
            } else {
                print!("{}", render_list(&entries));
            }
        }
        Command::Tree { json: as_json } => {
            if as_json {
                println!("{}", json(&ctx.store().tree())?);
            } else {
                print!("{}", render_tree(&ctx.store().tree(), &config.root, ctx.today()));
            }
        }
        Command::Config { action, key, value } => {
            run_config(&store, config.clone(), &registry, &action, key, value)?;
        }
        Command::Archive { name, json: as_json } => {
            let report = lifecycle::archive(&ctx, &name)?;
            emit("Archiving workspace", &report, as_json)?;
        }
        Command::Version => {}
    }
    Ok(())
}

fn emit(title: &str, report: &Report, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", json(report)?);
    } else {
        print!("{}", render_report(title, report));
    }
    Ok(())
}

fn run_config(
    store: &ConfigStore,
    mut config: WsConfig,
    registry: &Registry,
    action: &str,
    key: Option<String>,
    value: Option<String>,
) -> Result<()> {
    match action {
        "show" => println!("{}", json(&config)?),
        "get" => {
            let Some(key) = key else {
                bail!("Usage: ws config get <key>");
            };
            let value = config.get_value(&key)?;
            match value.as_str() {
                Some(text) => println!("{text}"),
                None => println!("{}", json(&value)?),
            }
        }
        "set" => {
            let (Some(key), Some(value)) = (key, value) else {
                bail!("Usage: ws config set <key> <value>");
            };
            config.set_value(&key, &value)?;
            store.save(&config)?;
            println!("Set {key} = {value}");
        }
        "preset" => match key {
            None => print!(
                "{}",
                render_presets(&store.list_presets()?, config.preset.as_deref())
            ),
            Some(name) => {
                store.apply_preset(&mut config, &name)?;
                store.save(&config)?;
                println!("Applied preset: {name}");
                print!("{}", render_adapters(&registry.list(), &config));
            }
        },
        "adapters" => print!("{}", render_adapters(&registry.list(), &config)),
        other => bail!("Unknown config action: {other}. Use: show, get, set, preset, adapters"),
    }
    Ok(())
}
