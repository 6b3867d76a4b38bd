//! The interaction stream: peer messages raced against peer exit.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio_util::task::AbortOnDropHandle;

use super::channel::MessageReceiver;
use super::process::ExitSignal;

/// Stream of messages received from the peer.
///
/// Ends when the peer exits. Messages still queued at that point are dropped:
/// if a message and the exit are both ready in the same step, that one message
/// is yielded and the stream ends right after it. Dropping the stream aborts
/// the reader feeding it.
pub struct Interaction {
    inner: BoxStream<'static, serde_json::Value>,
}

impl Interaction {
    pub(crate) fn new(
        exit: ExitSignal,
        rx: MessageReceiver,
        reader: Option<AbortOnDropHandle<()>>,
    ) -> Self {
        let state = LoopState {
            exit,
            rx,
            reader,
            reader_open: true,
            exited: false,
        };
        Self {
            inner: stream::unfold(state, step).fuse().boxed(),
        }
    }

    /// A stream that ends immediately.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: stream::empty().boxed(),
        }
    }
}

impl Stream for Interaction {
    type Item = serde_json::Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interaction").finish_non_exhaustive()
    }
}

struct LoopState {
    exit: ExitSignal,
    rx: MessageReceiver,
    reader: Option<AbortOnDropHandle<()>>,
    /// False once the reader has finished and the queue is drained.
    reader_open: bool,
    /// Exit was observed together with the last yielded message.
    exited: bool,
}

impl LoopState {
    fn stop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        tracing::debug!(dropped = self.rx.backlog(), "Interaction ended");
    }
}

enum Race {
    Message(Option<serde_json::Value>),
    Exited,
}

async fn step(mut state: LoopState) -> Option<(serde_json::Value, LoopState)> {
    while !state.exited {
        let race = if state.reader_open {
            tokio::select! {
                biased;
                message = state.rx.next() => Race::Message(message),
                _ = state.exit.wait() => Race::Exited,
            }
        } else {
            state.exit.wait().await;
            Race::Exited
        };

        match race {
            Race::Message(Some(message)) => {
                state.exited = !state.exit.is_alive();
                return Some((message, state));
            }
            Race::Message(None) => state.reader_open = false,
            Race::Exited => break,
        }
    }

    state.stop();
    None
}
