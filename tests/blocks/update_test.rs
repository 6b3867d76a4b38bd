//! Integration tests for sending updates to the peer.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use rofi_blocks::blocks::{BlocksClient, BlocksCommand, ClientState, InputAction, UpdateCommand};
use serde_json::json;
use tempfile::TempDir;
use tokio::time::timeout;

use super::{peer, TEST_TIMEOUT};

/// Peer that echoes every stdin line back on stdout.
const ECHO_PEER: &str = r#"while IFS= read -r line; do printf '%s\n' "$line"; done"#;

#[tokio::test]
async fn empty_update_sends_empty_object() {
    let client = BlocksClient::start(peer(ECHO_PEER)).unwrap();
    let mut events = client.interact();

    client.update(&UpdateCommand::new()).await;

    let echoed = timeout(TEST_TIMEOUT, events.next()).await.unwrap();
    assert_eq!(echoed, Some(json!({})));
}

#[tokio::test]
async fn update_sends_only_set_fields() {
    let client = BlocksClient::start(peer(ECHO_PEER)).unwrap();
    let mut events = client.interact();

    client.update(&UpdateCommand::new().prompt("x")).await;

    let echoed = timeout(TEST_TIMEOUT, events.next()).await.unwrap().unwrap();
    assert_eq!(echoed, json!({"prompt": "x"}));
}

#[tokio::test]
async fn input_action_uses_spaced_key() {
    let client = BlocksClient::start(peer(ECHO_PEER)).unwrap();
    let mut events = client.interact();

    client
        .update(&UpdateCommand::new().input_action(InputAction::Filter))
        .await;

    let echoed = timeout(TEST_TIMEOUT, events.next()).await.unwrap().unwrap();
    assert_eq!(echoed["input action"], "filter");
    assert!(echoed.get("input_action").is_none());
}

#[tokio::test]
async fn updates_are_delivered_in_call_order() {
    let client = BlocksClient::start(peer(ECHO_PEER)).unwrap();
    let mut events = client.interact();

    client
        .update(&UpdateCommand::new().lines(["a", "b"]).active_entry(1))
        .await;
    client.update(&UpdateCommand::new().message("done")).await;

    let first = timeout(TEST_TIMEOUT, events.next()).await.unwrap().unwrap();
    let second = timeout(TEST_TIMEOUT, events.next()).await.unwrap().unwrap();
    assert_eq!(first, json!({"lines": ["a", "b"], "active_entry": 1}));
    assert_eq!(second, json!({"message": "done"}));
}

#[tokio::test]
async fn concurrent_updates_do_not_interleave() {
    let client = BlocksClient::start(peer(ECHO_PEER)).unwrap();
    let mut events = client.interact();
    let long_lines: Vec<String> = (0..2000).map(|i| format!("entry number {i}")).collect();
    let big = UpdateCommand::new().lines(long_lines);
    let small = UpdateCommand::new().prompt("small");

    tokio::join!(client.update(&big), client.update(&small));

    let mut received = Vec::new();
    for _ in 0..2 {
        received.push(timeout(TEST_TIMEOUT, events.next()).await.unwrap().unwrap());
    }
    assert!(received.contains(&serde_json::to_value(&big).unwrap()));
    assert!(received.contains(&json!({"prompt": "small"})));
}

/// Peer whose stdin is copied to `$1` by a background `cat`.
///
/// The shell exits after `linger` while `cat` keeps reading, so writes made
/// after the exit would still land in the file.
fn logging_peer(path: &Path, linger: &str) -> BlocksCommand {
    let script = format!(r#"cat > "$1" <&0 & sleep {linger}; exit 0"#);
    BlocksCommand::with_prefix(["sh", "-c", script.as_str(), "sh", path.to_str().unwrap()])
}

#[tokio::test]
async fn update_after_exit_is_silent_no_op() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stdin.log");
    let client = BlocksClient::start(logging_peer(&path, "0.2")).unwrap();
    let exit = client.exit_signal().unwrap();

    client.update(&UpdateCommand::new().prompt("first")).await;
    timeout(TEST_TIMEOUT, exit.wait()).await.unwrap();
    assert_eq!(client.state(), ClientState::Exited);

    client.update(&UpdateCommand::new().prompt("second")).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "{\"prompt\":\"first\"}\n");
}

#[tokio::test]
async fn update_right_after_terminate_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stdin.log");
    let client = BlocksClient::start(logging_peer(&path, "30")).unwrap();
    let exit = client.exit_signal().unwrap();

    client.terminate();
    assert_eq!(client.state(), ClientState::Exited);
    assert!(!client.is_alive());

    client.update(&UpdateCommand::new().prompt("late")).await;
    timeout(TEST_TIMEOUT, exit.wait()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let written = std::fs::read_to_string(&path).unwrap_or_default();
    assert_eq!(written, "");
}

#[tokio::test]
async fn update_to_peer_that_closed_stdin_is_absorbed() {
    // Peer closes its stdin but keeps running.
    let client = BlocksClient::start(peer("exec 0<&-; sleep 30")).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    client.update(&UpdateCommand::new().message("nobody listens")).await;
    client.update(&UpdateCommand::new().message("still fine")).await;

    assert_eq!(client.state(), ClientState::Running);
}
