use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long output is still drained once the child is gone. Daemons forked by
/// the child may hold the pipes open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub cwd: Option<PathBuf>,
    /// Falls back to [`DEFAULT_TIMEOUT`].
    pub timeout: Option<Duration>,
    pub env: Vec<(String, String)>,
}

impl RunOptions {
    pub fn in_dir(cwd: &Path) -> Self {
        Self {
            cwd: Some(cwd.to_path_buf()),
            ..Self::default()
        }
    }
}

/// Outcome of a scripted (non-interactive) command.
///
/// `launched == false` means the program could not be started at all,
/// which usually means it is not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub ok: bool,
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
    pub launched: bool,
    pub timed_out: bool,
}

impl CommandOutput {
    fn not_launched(message: String) -> Self {
        Self {
            ok: false,
            stdout: String::new(),
            stderr: message,
            code: None,
            launched: false,
            timed_out: false,
        }
    }

    /// Human-readable reason for a failed run.
    pub fn failure_detail(&self) -> String {
        if self.timed_out {
            return "timed out".to_string();
        }
        if !self.stderr.is_empty() {
            return self.stderr.clone();
        }
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Run a program with piped output and a bounded wait. Never panics and
/// never returns an error: launch failures and timeouts are folded into the
/// returned [`CommandOutput`].
pub fn run<I, S>(program: &str, args: I, options: &RunOptions) -> CommandOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = options.cwd.as_ref() {
        command.current_dir(cwd);
    }
    for (key, value) in &options.env {
        command.env(key, value);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    debug!(?command, "running");

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            debug!(program, %err, "failed to launch");
            return CommandOutput::not_launched(format!("failed to run {program}: {err}"));
        }
    };

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + options.timeout.unwrap_or(DEFAULT_TIMEOUT);
    let mut timed_out = false;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if Instant::now() >= deadline => {
                timed_out = true;
                kill_tree(&mut child);
                break child.wait().ok();
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                debug!(program, %err, "failed waiting for child");
                kill_tree(&mut child);
                break None;
            }
        }
    };

    let drain_until = Instant::now() + DRAIN_GRACE;
    let collect = |output: Option<mpsc::Receiver<Vec<u8>>>| {
        output
            .and_then(|rx| {
                rx.recv_timeout(drain_until.saturating_duration_since(Instant::now()))
                    .ok()
            })
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
            .unwrap_or_default()
    };
    let stdout = collect(stdout);
    let stderr = collect(stderr);

    let code = status.and_then(|status| status.code());
    let ok = !timed_out && status.map(|status| status.success()).unwrap_or(false);
    debug!(program, ?code, ok, timed_out, "finished");
    CommandOutput {
        ok,
        stdout,
        stderr,
        code,
        launched: true,
        timed_out,
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Kill the child together with everything it started in its process group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = i32::try_from(child.id()) {
            // SAFETY: signals only the process group created for this child.
            if unsafe { libc::kill(-pid, libc::SIGKILL) } == 0 {
                return;
            }
        }
    }
    let _ = child.kill();
}

/// Run a program attached to the caller's terminal and wait for it.
pub fn run_live<I, S>(program: &str, args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args);
    debug!(?command, "running interactively");
    match command.status() {
        Ok(status) => status.success(),
        Err(err) => {
            debug!(program, %err, "failed to launch");
            false
        }
    }
}

/// Start a program in the background and return without waiting for it.
pub fn spawn_detached<I, S>(program: &str, args: I) -> std::io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    debug!(?command, "spawning detached");
    let child = command.spawn()?;
    drop(child);
    Ok(())
}

pub fn is_installed(program: &str) -> bool {
    which::which(program).is_ok()
}
