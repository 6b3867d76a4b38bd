//! Integration tests for the interaction stream against real peer processes.

use std::time::Duration;

use futures_util::StreamExt;
use rofi_blocks::blocks::{BlocksClient, ClientState};
use serde_json::{json, Value};
use tokio::time::timeout;

use super::{peer, TEST_TIMEOUT};

#[tokio::test]
async fn messages_arrive_in_order() {
    let script = r#"printf '%s\n' '{"a":1}' '[1,2,3]' '"text"' '7' 'null'; read _"#;
    let client = BlocksClient::start(peer(script)).unwrap();

    let events: Vec<Value> = timeout(TEST_TIMEOUT, client.interact().take(5).collect())
        .await
        .unwrap();

    assert_eq!(
        events,
        vec![json!({"a": 1}), json!([1, 2, 3]), json!("text"), json!(7), json!(null)]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn messages_arrive_in_order_on_multi_thread_runtime() {
    let script = r#"i=0; while [ $i -lt 50 ]; do printf '{"seq":%d}\n' "$i"; i=$((i+1)); done; read _"#;
    let client = BlocksClient::start(peer(script)).unwrap();

    let events: Vec<Value> = timeout(TEST_TIMEOUT, client.interact().take(50).collect())
        .await
        .unwrap();

    let seqs: Vec<i64> = events.iter().filter_map(|e| e["seq"].as_i64()).collect();
    assert_eq!(seqs, (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn noise_is_skipped_without_breaking_the_stream() {
    let script = r#"printf '\n   \nnot json\n{"broken":\n{"ok":true}\n'; read _"#;
    let client = BlocksClient::start(peer(script)).unwrap();
    let mut events = client.interact();

    let first = timeout(TEST_TIMEOUT, events.next()).await.unwrap();
    assert_eq!(first, Some(json!({"ok": true})));

    let more = timeout(Duration::from_millis(100), events.next()).await;
    assert!(more.is_err(), "no further events expected");
    assert_eq!(client.state(), ClientState::Running);
}

#[tokio::test]
async fn stream_ends_when_peer_exits() {
    let script = r#"printf '%s\n' '{"n":1}' '{"n":2}'; exit 0"#;
    let client = BlocksClient::start(peer(script)).unwrap();

    let events: Vec<Value> = timeout(TEST_TIMEOUT, client.interact().collect())
        .await
        .unwrap();

    // Lines still unread when the exit is seen are dropped, so only an
    // in-order prefix is guaranteed.
    let expected = [json!({"n": 1}), json!({"n": 2})];
    assert!(events.len() <= expected.len());
    assert_eq!(events[..], expected[..events.len()]);
    assert_eq!(client.state(), ClientState::Exited);
}

#[tokio::test]
async fn output_left_unread_at_exit_is_dropped() {
    let script = r#"i=0; while [ $i -lt 500 ]; do printf '{"seq":%d}\n' "$i"; i=$((i+1)); done; exit 0"#;
    let client = BlocksClient::start(peer(script)).unwrap();
    let exit = client.exit_signal().unwrap();

    // The peer is gone before anyone reads its 500 lines.
    timeout(TEST_TIMEOUT, exit.wait()).await.unwrap();
    let events: Vec<Value> = timeout(TEST_TIMEOUT, client.interact().collect())
        .await
        .unwrap();

    assert!(events.is_empty(), "lines queued behind an exit are not delivered");
}

#[tokio::test]
async fn stream_ends_when_client_terminates_peer() {
    let client = BlocksClient::start(peer("read _")).unwrap();
    let mut events = client.interact();

    client.terminate();

    assert_eq!(timeout(TEST_TIMEOUT, events.next()).await.unwrap(), None);
}

#[tokio::test]
async fn invalid_utf8_noise_does_not_stop_delivery() {
    let script = r#"printf '\377\376 junk\n{"ok":true}\n'; read _"#;
    let client = BlocksClient::start(peer(script)).unwrap();
    let mut events = client.interact();

    let event = timeout(TEST_TIMEOUT, events.next()).await.unwrap();
    assert_eq!(event, Some(json!({"ok": true})));
    assert_eq!(client.state(), ClientState::Running);
}
