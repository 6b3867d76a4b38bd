//! Peer process spawning and lifetime control.
//!
//! A [`BlocksProcess`] owns the spawned rofi process. The child itself is
//! moved into a background exit watcher, which reports the exit status over a
//! watch channel so any number of [`ExitSignal`] clones can observe it without
//! contending for the child handle.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Program used when no prefix is configured.
pub const DEFAULT_PROGRAM: &str = "rofi";

/// Fixed arguments that put rofi into blocks mode.
pub const BLOCKS_MODE_ARGS: [&str; 4] = ["-modi", "blocks", "-show", "blocks"];

/// Error type for launching the peer process.
#[derive(thiserror::Error, Debug)]
pub enum LaunchError {
    /// The command prefix had no program in it.
    #[error("Launch command is empty")]
    EmptyCommand,
    /// The binary was not found.
    #[error("Peer binary not found")]
    NotFound,
    /// Permission denied when spawning.
    #[error("Permission denied")]
    PermissionDenied,
    /// A piped standard stream was not available after spawning.
    #[error("Process {0} not available")]
    MissingPipe(&'static str),
    /// The client already launched its process once.
    #[error("Process already launched")]
    AlreadyLaunched,
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LaunchError {
    /// Create a `LaunchError` from an I/O error, classifying common cases.
    fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io(err),
        }
    }
}

/// Launch configuration for the peer process.
///
/// The argument vector is the configurable prefix followed by
/// [`BLOCKS_MODE_ARGS`], so callers can point it at a wrapped binary
/// (`["env", "LANG=C", "rofi"]`, `["/opt/rofi/bin/rofi"]`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlocksCommand {
    prefix: Vec<String>,
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
}

impl Default for BlocksCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl BlocksCommand {
    /// Create a command that runs the default `rofi` binary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix([DEFAULT_PROGRAM])
    }

    /// Create a command with a custom invocation prefix.
    #[must_use]
    pub fn with_prefix<I, S>(prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefix: prefix.into_iter().map(Into::into).collect(),
            working_dir: None,
            env: HashMap::new(),
        }
    }

    /// Set the working directory for the peer process.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable for the peer process.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Get the invocation prefix.
    #[must_use]
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// Get the working directory, if set.
    #[must_use]
    pub fn get_working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// Build the full argument vector, program included.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        self.prefix
            .iter()
            .cloned()
            .chain(BLOCKS_MODE_ARGS.iter().map(|s| (*s).to_string()))
            .collect()
    }
}

/// Outcome reported once the peer process has terminated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit status, or `None` if it could not be collected.
    pub status: Option<ExitStatus>,
}

impl ProcessExit {
    /// Whether the process exited successfully.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.is_some_and(|s| s.success())
    }
}

/// Cloneable view of the peer's exit state.
///
/// Waiting has no side effect beyond the wait itself, so it is safe to await
/// from several tasks at once.
#[derive(Debug, Clone)]
pub struct ExitSignal {
    rx: watch::Receiver<Option<ProcessExit>>,
}

impl ExitSignal {
    pub(crate) fn new(rx: watch::Receiver<Option<ProcessExit>>) -> Self {
        Self { rx }
    }

    /// True until the process has been observed to exit.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        // A closed sender means the watcher is gone, so nobody owns the child.
        self.rx.borrow().is_none() && self.rx.has_changed().is_ok()
    }

    /// The exit outcome, if the process has exited.
    #[must_use]
    pub fn exit(&self) -> Option<ProcessExit> {
        match *self.rx.borrow() {
            Some(exit) => Some(exit),
            None if self.rx.has_changed().is_err() => Some(ProcessExit::default()),
            None => None,
        }
    }

    /// Wait until the process exits.
    pub async fn wait(&self) -> ProcessExit {
        let mut rx = self.rx.clone();
        let result = rx.wait_for(Option::is_some).await.map(|exit| *exit);
        result.ok().flatten().unwrap_or_default()
    }
}

/// A running peer process.
#[derive(Debug)]
pub struct BlocksProcess {
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    exit: ExitSignal,
    kill: CancellationToken,
}

impl BlocksProcess {
    /// Spawn the peer process with piped stdin and stdout.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` if the command is empty or the process fails to
    /// spawn.
    pub fn spawn(command: &BlocksCommand) -> Result<Self, LaunchError> {
        let args = command.args();
        let (program, rest) = match command.prefix.first() {
            Some(program) => (program, &args[1..]),
            None => return Err(LaunchError::EmptyCommand),
        };

        let mut cmd = Command::new(program);
        cmd.args(rest)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = command.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(LaunchError::from_io)?;
        let stdin = child.stdin.take().ok_or(LaunchError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(LaunchError::MissingPipe("stdout"))?;
        let pid = child.id();

        tracing::debug!(pid = ?pid, program = %program, "Spawned peer process");

        let (tx, rx) = watch::channel(None);
        let kill = CancellationToken::new();
        tokio::spawn(watch_exit(child, kill.clone(), tx));

        Ok(Self {
            pid,
            stdin: Some(stdin),
            stdout: Some(stdout),
            exit: ExitSignal::new(rx),
            kill,
        })
    }

    /// Take ownership of the stdin handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    /// Take ownership of the stdout handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Get the process ID assigned at spawn time.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Get a handle that resolves when the process exits.
    #[must_use]
    pub fn exit_signal(&self) -> ExitSignal {
        self.exit.clone()
    }

    /// Check whether the process is still running.
    ///
    /// False as soon as [`terminate`](Self::terminate) has been called, even
    /// if the kill has not been carried out yet.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.kill.is_cancelled() && self.exit.is_alive()
    }

    /// Wait for the process to exit.
    pub async fn wait(&self) -> ProcessExit {
        self.exit.wait().await
    }

    /// Forcefully kill the process.
    ///
    /// Idempotent: does nothing once the process has exited or a kill has
    /// already been requested.
    pub fn terminate(&self) {
        if self.is_alive() {
            tracing::debug!(pid = ?self.pid, "Terminating peer process");
            self.kill.cancel();
        }
    }

    /// Attempt graceful termination with a timeout.
    ///
    /// On Unix, sends SIGTERM first, then kills after the timeout.
    /// On other platforms, falls back to immediate kill.
    pub async fn graceful_terminate(&self, timeout: Duration) -> ProcessExit {
        #[cfg(unix)]
        self.send_sigterm();

        #[cfg(not(unix))]
        self.terminate();

        if let Ok(exit) = tokio::time::timeout(timeout, self.exit.wait()).await {
            return exit;
        }
        self.terminate();
        self.exit.wait().await
    }

    #[cfg(unix)]
    fn send_sigterm(&self) {
        use nix::sys::signal::{kill, Signal};

        if !self.is_alive() {
            return;
        }
        let Some(pid) = self.pid else {
            return;
        };
        let Some(nix_pid) = signal_target(pid) else {
            tracing::debug!(pid, "Pid out of range, SIGTERM skipped");
            return;
        };
        if let Err(e) = kill(nix_pid, Signal::SIGTERM) {
            tracing::debug!(pid, error = %e, "SIGTERM failed");
        }
    }
}

/// Convert an OS pid into a signal target.
///
/// `None` for values that would turn into a process group or broadcast target.
#[cfg(unix)]
fn signal_target(pid: u32) -> Option<nix::unistd::Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|raw| *raw > 0)
        .map(nix::unistd::Pid::from_raw)
}

impl Drop for BlocksProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Own the child until it exits, killing it first if asked to.
async fn watch_exit(
    mut child: Child,
    kill: CancellationToken,
    tx: watch::Sender<Option<ProcessExit>>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        () = kill.cancelled() => match child.kill().await {
            Ok(()) => child.wait().await,
            Err(e) => Err(e),
        },
    };

    let exit = match status {
        Ok(status) => ProcessExit {
            status: Some(status),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to collect peer exit status");
            ProcessExit::default()
        }
    };

    tracing::debug!(status = ?exit.status, "Peer process exited");
    tx.send_replace(Some(exit));
}
