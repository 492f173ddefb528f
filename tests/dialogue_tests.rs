use anyhow::Result;
use std::time::Duration;

use vidbot::bot::dialogue_manager::GuidedCollector;
use vidbot::db::{MemoryRecordStore, RecordStore};
use vidbot::dialogue::{CollectorInput, CollectorState};
use vidbot::localization::t;

const STORE_TIMEOUT: Duration = Duration::from_secs(1);

/// Integration test for the guided collection against a real store
#[tokio::test]
async fn test_guided_collection_saves_record() -> Result<()> {
    let store = MemoryRecordStore::new();
    let collector = GuidedCollector::new();

    let reply = collector
        .handle(7, CollectorInput::Start, &store, STORE_TIMEOUT)
        .await;
    assert_eq!(reply.map(|r| r.text), Some(t("collect-ask-url")));
    assert_eq!(collector.active_sessions(), 1);

    collector
        .handle(7, CollectorInput::Text("http://x/1"), &store, STORE_TIMEOUT)
        .await;
    let reply = collector
        .handle(7, CollectorInput::Text("Intro"), &store, STORE_TIMEOUT)
        .await;

    let text = reply.map(|r| r.text).unwrap_or_default();
    assert!(text.contains("Video saved with ID:"), "{text}");
    assert_eq!(collector.active_sessions(), 0);

    let videos = store.list().await?;
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].title, "Intro");
    assert_eq!(videos[0].url, "http://x/1");

    Ok(())
}

/// Plain text outside a collection is left for other handlers
#[tokio::test]
async fn test_idle_text_falls_through() -> Result<()> {
    let store = MemoryRecordStore::new();
    let collector = GuidedCollector::new();

    let reply = collector
        .handle(7, CollectorInput::Text("hello"), &store, STORE_TIMEOUT)
        .await;
    assert!(reply.is_none());
    assert_eq!(collector.active_sessions(), 0);
    assert_eq!(store.count().await?, 0);

    Ok(())
}

/// Restarting mid-collection drops the pending URL
#[tokio::test]
async fn test_restart_discards_pending_url() -> Result<()> {
    let store = MemoryRecordStore::new();
    let collector = GuidedCollector::new();

    collector
        .handle(7, CollectorInput::Start, &store, STORE_TIMEOUT)
        .await;
    collector
        .handle(7, CollectorInput::Text("http://old"), &store, STORE_TIMEOUT)
        .await;
    collector
        .handle(7, CollectorInput::Start, &store, STORE_TIMEOUT)
        .await;

    assert_eq!(collector.state(7), CollectorState::AwaitingUrl);
    assert_eq!(collector.active_sessions(), 1);

    Ok(())
}

/// Dialogue states survive serde_json
#[test]
fn test_dialogue_state_serialization() -> Result<()> {
    let state = CollectorState::AwaitingTitle {
        pending_url: "http://x/1".to_string(),
    };

    let json = serde_json::to_string(&state)?;
    let restored: CollectorState = serde_json::from_str(&json)?;
    assert_eq!(restored, state);

    Ok(())
}
