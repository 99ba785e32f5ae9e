//! Broadcast pass invariants over the recording mock.

mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::{Attempt, RecordingDelivery};
use recast::broadcast::{Outcome, Payload, broadcast, run_pass};
use recast::core::models::{User, UserStatus};
use recast::delivery::Delivery;
use recast::roster::RosterStore;

const OPERATOR: i64 = 7;

fn user(id: i64, status: UserStatus) -> User {
    User {
        id,
        name: format!("user-{}", id),
        username: None,
        status,
    }
}

fn scratch_store(tag: &str) -> (RosterStore, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!(
        "recast-broadcast-{}-{}.json",
        tag,
        std::process::id()
    ));
    (RosterStore::new(&path), path)
}

#[tokio::test]
async fn counters_add_up_and_blocked_users_are_reclassified_durably() {
    let mock = Arc::new(RecordingDelivery::new());
    let delivery: Arc<dyn Delivery> = mock.clone();
    mock.fail_sends_to(2, "Forbidden: bot was blocked by the user");
    mock.fail_sends_to(4, "Too Many Requests: retry after 5");

    let mut users = HashMap::new();
    users.insert(1, user(1, UserStatus::Active));
    users.insert(2, user(2, UserStatus::Active));
    users.insert(3, user(3, UserStatus::Blocked));
    users.insert(4, user(4, UserStatus::Active));
    let roster = Arc::new(Mutex::new(users));
    let (store, path) = scratch_store("reclassify");

    let outcome = broadcast(
        delivery,
        roster.clone(),
        store.clone(),
        OPERATOR,
        Payload::Text("hello".to_string()),
    )
    .await;

    assert_eq!(
        outcome,
        Outcome {
            sent: 1,
            blocked: 1,
            failed: 1
        }
    );
    assert_eq!(outcome.sent + outcome.blocked + outcome.failed, 3);

    {
        let users = roster.lock().unwrap();
        assert_eq!(users[&2].status, UserStatus::Blocked);
        assert_eq!(users[&4].status, UserStatus::Active, "transient failure must not mutate");
        assert_eq!(users[&3].status, UserStatus::Blocked);
    }

    // The reclassification must have been persisted.
    let reloaded = store.load();
    assert_eq!(reloaded[&2].status, UserStatus::Blocked);
    assert_eq!(reloaded[&4].status, UserStatus::Active);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn already_blocked_users_are_skipped() {
    let mock = Arc::new(RecordingDelivery::new());
    let delivery: Arc<dyn Delivery> = mock.clone();

    let mut users = HashMap::new();
    users.insert(1, user(1, UserStatus::Active));
    users.insert(2, user(2, UserStatus::Blocked));
    let roster = Arc::new(Mutex::new(users));
    let (store, path) = scratch_store("skip");

    let outcome = broadcast(
        delivery,
        roster,
        store,
        OPERATOR,
        Payload::Text("hi".to_string()),
    )
    .await;

    assert_eq!(
        outcome,
        Outcome {
            sent: 1,
            blocked: 0,
            failed: 0
        }
    );
    assert!(mock.texts_to(2).is_empty(), "blocked users get nothing");
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn failed_recipients_are_attempted_exactly_once() {
    let mock = Arc::new(RecordingDelivery::new());
    mock.fail_sends_to(9, "Internal Server Error");

    let (outcome, gone) = run_pass(
        mock.as_ref(),
        &[9],
        &Payload::Text("ping".to_string()),
    )
    .await;

    assert_eq!(
        outcome,
        Outcome {
            sent: 0,
            blocked: 0,
            failed: 1
        }
    );
    assert!(gone.is_empty());
    assert_eq!(mock.texts_to(9).len(), 1, "no retry on transient failure");
}

#[tokio::test]
async fn empty_active_roster_yields_zero_counters() {
    let mock = Arc::new(RecordingDelivery::new());
    let (outcome, gone) = run_pass(mock.as_ref(), &[], &Payload::Text("x".to_string())).await;
    assert_eq!(outcome, Outcome::default());
    assert!(gone.is_empty());
}

#[tokio::test]
async fn status_message_is_edited_in_place_with_final_counts() {
    let mock = Arc::new(RecordingDelivery::new());
    let delivery: Arc<dyn Delivery> = mock.clone();

    let mut users = HashMap::new();
    users.insert(1, user(1, UserStatus::Active));
    let roster = Arc::new(Mutex::new(users));
    let (store, path) = scratch_store("status");

    broadcast(
        delivery,
        roster,
        store,
        OPERATOR,
        Payload::Text("news".to_string()),
    )
    .await;

    assert_eq!(mock.texts_to(OPERATOR), vec!["📡 Broadcasting..."]);
    let edits = mock.edits();
    assert_eq!(edits.len(), 1, "one message goes from in-progress to complete");
    assert!(edits[0].1.contains("✓ Sent: 1"));
    assert!(edits[0].1.contains("🚫 Blocked: 0"));
    assert!(edits[0].1.contains("✗ Failed: 0"));
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn text_payload_carries_the_broadcast_prefix() {
    let mock = Arc::new(RecordingDelivery::new());
    run_pass(mock.as_ref(), &[1], &Payload::Text("hello".to_string())).await;
    assert_eq!(mock.texts_to(1), vec!["📢 Broadcast:\n\nhello"]);
}

#[tokio::test]
async fn media_payloads_keep_original_caption_and_dimensions() {
    let mock = Arc::new(RecordingDelivery::new());

    run_pass(
        mock.as_ref(),
        &[1],
        &Payload::Video {
            file_id: "vid".to_string(),
            caption: Some("original".to_string()),
            duration: 30,
            width: 1920,
            height: 1080,
        },
    )
    .await;
    run_pass(
        mock.as_ref(),
        &[1],
        &Payload::Photo {
            file_id: "pic".to_string(),
            caption: None,
        },
    )
    .await;
    run_pass(
        mock.as_ref(),
        &[1],
        &Payload::Document {
            file_id: "doc".to_string(),
            caption: Some("report".to_string()),
        },
    )
    .await;

    let attempts = mock.attempts();
    assert!(attempts.contains(&Attempt::Video {
        recipient: 1,
        file_id: "vid".to_string(),
        caption: Some("original".to_string()),
        thumbnail: None,
        duration: 30,
        width: 1920,
        height: 1080,
    }));
    assert!(attempts.contains(&Attempt::Photo {
        recipient: 1,
        file_id: "pic".to_string(),
        caption: None,
    }));
    assert!(attempts.contains(&Attempt::Document {
        recipient: 1,
        file_id: "doc".to_string(),
        caption: Some("report".to_string()),
    }));
}
