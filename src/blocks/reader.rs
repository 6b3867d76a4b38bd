//! Background task draining peer stdout into a message channel.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;
use tokio::sync::Mutex;
use tokio_util::task::AbortOnDropHandle;

use super::channel::MessageSender;
use super::decode::{decode_line, DecodedLine};
use super::process::ExitSignal;

/// Raw line reader over the peer's stdout.
///
/// Lines are read as bytes, so output that is not UTF-8 is just another
/// undecodable line. A partially read line stays in `pending` when the read
/// is cancelled and is completed by the next call.
#[derive(Debug)]
pub struct PeerOutput<R = BufReader<ChildStdout>> {
    reader: R,
    pending: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> PeerOutput<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
        }
    }

    /// Read the next line, terminator included, or `None` at end of stream.
    ///
    /// Cancel safe.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the underlying stream fails.
    pub async fn next_line(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let read = self.reader.read_until(b'\n', &mut self.pending).await?;
        if read == 0 && self.pending.is_empty() {
            return Ok(None);
        }
        Ok(Some(std::mem::take(&mut self.pending)))
    }
}

/// Peer stdout shared between successive readers.
///
/// A reader holds the lock for its whole life, so aborting one leaves the
/// stream positioned for the next.
pub type SharedOutput<R = BufReader<ChildStdout>> = Arc<Mutex<PeerOutput<R>>>;

/// Wrap a stdout handle for use with [`spawn_reader`].
#[must_use]
pub fn shared_output(stdout: ChildStdout) -> SharedOutput {
    Arc::new(Mutex::new(PeerOutput::new(BufReader::new(stdout))))
}

/// Spawn a reader that pushes every decoded message into `tx`.
///
/// Runs while the peer is alive, until stdout closes or the receiver goes
/// away. Dropping the returned handle aborts the task.
pub fn spawn_reader<R>(
    output: SharedOutput<R>,
    exit: ExitSignal,
    tx: MessageSender,
) -> AbortOnDropHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    AbortOnDropHandle::new(tokio::spawn(read_lines(output, exit, tx)))
}

async fn read_lines<R>(output: SharedOutput<R>, exit: ExitSignal, tx: MessageSender)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let mut output = output.lock_owned().await;

    while exit.is_alive() {
        // Lets a pending exit check run even when stdout never produces data.
        tokio::task::yield_now().await;

        let line = match output.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("Peer stdout closed");
                break;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read peer stdout");
                break;
            }
        };

        if let DecodedLine::Message(message) = decode_line(&line) {
            if !tx.push(message) {
                break;
            }
        }
    }
}
