//! Registry routing: one worker per identity, per-identity ordering.

mod common;

use common::{profile, registry_with, text_update, MemStore, RecordingTransport};
use shopbot::strings;
use std::time::Duration;

#[tokio::test]
async fn concurrent_first_events_spawn_exactly_one_worker() {
    let transport = RecordingTransport::new();
    let store = MemStore::new();
    let registry = registry_with(&transport, &store, Duration::from_secs(30));
    let chat = profile(21, "Eve");

    let first = {
        let registry = registry.clone();
        let update = text_update(&chat, "/start");
        tokio::spawn(async move { registry.route_event(update).await })
    };
    let second = {
        let registry = registry.clone();
        let update = text_update(&chat, "/start");
        tokio::spawn(async move { registry.route_event(update).await })
    };
    let (first, second) = tokio::join!(first, second);
    assert!(first.is_ok() && second.is_ok());

    assert_eq!(registry.len().await, 1);

    registry.stop(chat.id, None).await;
    assert_eq!(
        transport
            .count_with_text(strings::CONVERSATION_AFTER_START)
            .await,
        1
    );
}

#[tokio::test]
async fn events_for_one_identity_are_handled_in_order() {
    let transport = RecordingTransport::new();
    let store = MemStore::new();
    let registry = registry_with(&transport, &store, Duration::from_secs(30));
    let chat = profile(22, "Ada");

    registry.route_event(text_update(&chat, "/start")).await;
    registry
        .route_event(text_update(&chat, strings::MENU_INFO))
        .await;
    registry
        .route_event(text_update(&chat, strings::MENU_ORDER))
        .await;
    // The stop signal queues behind both selections, so the worker drains
    // them first.
    registry.stop(chat.id, None).await;

    let sent = transport.sent().await;
    let info_pos = sent.iter().position(|m| m.text == strings::BOT_INFO);
    let order_pos = sent
        .iter()
        .position(|m| m.text == strings::ORDER_PLACEHOLDER);
    match (info_pos, order_pos) {
        (Some(info), Some(order)) => assert!(info < order, "replies arrived out of order"),
        other => panic!("expected both menu replies, got {other:?}"),
    }
}

#[tokio::test]
async fn distinct_identities_get_distinct_workers() {
    let transport = RecordingTransport::new();
    let store = MemStore::new();
    let registry = registry_with(&transport, &store, Duration::from_secs(30));
    let ada = profile(23, "Ada");
    let eve = profile(24, "Eve");

    registry.route_event(text_update(&ada, "/start")).await;
    registry.route_event(text_update(&eve, "/start")).await;

    assert_eq!(registry.len().await, 2);
    assert!(registry.contains(ada.id).await);
    assert!(registry.contains(eve.id).await);

    registry.stop_all(None).await;
    assert!(registry.is_empty().await);
}
