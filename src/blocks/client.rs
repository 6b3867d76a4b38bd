//! Client driving a rofi blocks-mode process.
//!
//! The client owns at most one peer process for its whole life. Dropping the
//! client kills the peer if it is still running, however the owning scope
//! ends.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::sync::Mutex;

use super::channel::message_channel;
use super::interaction::Interaction;
use super::process::{BlocksCommand, BlocksProcess, ExitSignal, LaunchError, ProcessExit};
use super::reader::{shared_output, spawn_reader, SharedOutput};
use super::update::UpdateCommand;

/// Lifecycle state of a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientState {
    /// No process launched yet.
    #[default]
    Unstarted,
    /// The peer process is running.
    Running,
    /// The peer process has exited or was terminated.
    Exited,
}

/// Pipes and handle of a launched peer.
#[derive(Debug)]
struct Session {
    process: BlocksProcess,
    stdin: Mutex<ChildStdin>,
    stdout: SharedOutput,
}

#[derive(Debug)]
enum Slot {
    Unstarted,
    Launched(Session),
    Released,
}

/// Client for a rofi process running in blocks mode.
#[derive(Debug)]
pub struct BlocksClient {
    command: BlocksCommand,
    slot: Slot,
}

impl BlocksClient {
    /// Create a client that has not launched its process yet.
    #[must_use]
    pub fn new(command: BlocksCommand) -> Self {
        Self {
            command,
            slot: Slot::Unstarted,
        }
    }

    /// Create a client and launch its process.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` if the process fails to spawn.
    pub fn start(command: BlocksCommand) -> Result<Self, LaunchError> {
        let mut client = Self::new(command);
        client.launch()?;
        Ok(client)
    }

    /// Launch the peer process.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::AlreadyLaunched` if this client launched before,
    /// or another `LaunchError` if the process fails to spawn.
    pub fn launch(&mut self) -> Result<(), LaunchError> {
        if !matches!(self.slot, Slot::Unstarted) {
            return Err(LaunchError::AlreadyLaunched);
        }

        let mut process = BlocksProcess::spawn(&self.command)?;
        let stdin = process
            .take_stdin()
            .ok_or(LaunchError::MissingPipe("stdin"))?;
        let stdout = process
            .take_stdout()
            .ok_or(LaunchError::MissingPipe("stdout"))?;

        self.slot = Slot::Launched(Session {
            process,
            stdin: Mutex::new(stdin),
            stdout: shared_output(stdout),
        });
        Ok(())
    }

    /// Get the launch configuration.
    #[must_use]
    pub fn command(&self) -> &BlocksCommand {
        &self.command
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ClientState {
        match &self.slot {
            Slot::Unstarted => ClientState::Unstarted,
            Slot::Launched(session) if session.process.is_alive() => ClientState::Running,
            Slot::Launched(_) | Slot::Released => ClientState::Exited,
        }
    }

    /// Whether the peer process is running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state() == ClientState::Running
    }

    /// Process ID of the peer, if launched.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.session().and_then(|s| s.process.id())
    }

    /// Get a handle that resolves when the peer exits.
    #[must_use]
    pub fn exit_signal(&self) -> Option<ExitSignal> {
        self.session().map(|s| s.process.exit_signal())
    }

    /// Send an update to the peer.
    ///
    /// Best effort: does nothing unless the peer is running, and write
    /// failures to a peer that went away are ignored. Concurrent calls never
    /// interleave their bytes.
    pub async fn update(&self, update: &UpdateCommand) {
        let Some(session) = self.running_session() else {
            tracing::debug!("Peer not running, update skipped");
            return;
        };

        let line = match update.encode_line() {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode update");
                return;
            }
        };

        let mut stdin = session.stdin.lock().await;
        if !session.process.is_alive() {
            return;
        }
        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await
        };
        if let Err(e) = written.await {
            tracing::debug!(error = %e, "Failed to write update to peer");
        }
    }

    /// Stream the messages the peer emits until it exits.
    ///
    /// Each call spawns a fresh reader on the peer's stdout; a stream dropped
    /// mid-way leaves the remaining output for the next call. Returns an
    /// empty stream if the client was never launched.
    #[must_use]
    pub fn interact(&self) -> Interaction {
        let Some(session) = self.session() else {
            return Interaction::empty();
        };

        let exit = session.process.exit_signal();
        let (tx, rx) = message_channel();
        let reader = spawn_reader(session.stdout.clone(), exit.clone(), tx);
        Interaction::new(exit, rx, Some(reader))
    }

    /// Kill the peer if it is still running. Idempotent.
    pub fn terminate(&self) {
        if let Some(session) = self.session() {
            session.process.terminate();
        }
    }

    /// Kill the peer, wait for it to exit, and release the handle.
    ///
    /// Returns `None` if the client never launched.
    pub async fn shutdown(mut self) -> Option<ProcessExit> {
        let session = self.release()?;
        session.process.terminate();
        Some(session.process.wait().await)
    }

    /// Ask the peer to exit, kill it after `timeout`, and release the handle.
    ///
    /// Returns `None` if the client never launched.
    pub async fn shutdown_gracefully(mut self, timeout: Duration) -> Option<ProcessExit> {
        let session = self.release()?;
        Some(session.process.graceful_terminate(timeout).await)
    }

    fn release(&mut self) -> Option<Session> {
        match std::mem::replace(&mut self.slot, Slot::Released) {
            Slot::Launched(session) => Some(session),
            Slot::Unstarted | Slot::Released => None,
        }
    }

    fn session(&self) -> Option<&Session> {
        match &self.slot {
            Slot::Launched(session) => Some(session),
            Slot::Unstarted | Slot::Released => None,
        }
    }

    fn running_session(&self) -> Option<&Session> {
        self.session().filter(|s| s.process.is_alive())
    }
}

impl Drop for BlocksClient {
    fn drop(&mut self) {
        self.terminate();
    }
}
