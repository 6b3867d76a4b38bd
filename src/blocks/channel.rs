//! Unbounded FIFO carrying decoded messages from the reader to the consumer.

use tokio::sync::mpsc;

/// Create a connected sender/receiver pair.
#[must_use]
pub fn message_channel() -> (MessageSender, MessageReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MessageSender { tx }, MessageReceiver { rx })
}

/// Producer half, held by the stdout reader.
#[derive(Debug)]
pub struct MessageSender {
    tx: mpsc::UnboundedSender<serde_json::Value>,
}

impl MessageSender {
    /// Queue a message. Returns `false` once the receiver is gone.
    pub fn push(&self, message: serde_json::Value) -> bool {
        self.tx.send(message).is_ok()
    }

    /// Whether the receiver has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, held by the interaction stream.
#[derive(Debug)]
pub struct MessageReceiver {
    rx: mpsc::UnboundedReceiver<serde_json::Value>,
}

impl MessageReceiver {
    /// Wait for the next message, or `None` once the sender is gone and the
    /// queue is drained.
    ///
    /// Cancel safe.
    pub async fn next(&mut self) -> Option<serde_json::Value> {
        self.rx.recv().await
    }

    /// Number of messages queued but not yet received.
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.rx.len()
    }
}
