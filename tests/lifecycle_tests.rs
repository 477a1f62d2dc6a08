// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::sleep;

use budgetvault::config::DisplayMode;
use budgetvault::gateway::ActiveBackend;
use budgetvault::lifecycle::{HostMessage, HostReply, LifecycleSignal};
use budgetvault::store::{keys, KeyValueStore};

use common::{app, app_with_kv, config, ScriptedBackend};

#[tokio::test(start_paused = true)]
async fn hidden_saves_now_and_backs_up_later() {
    let backend = ScriptedBackend::new();
    let a = app(backend.clone(), DisplayMode::Browser);
    let (tx, _rx) = mpsc::unbounded_channel();
    let bridge = a.bridge(tx);

    a.coordinator.update(|s| s.savings_percentage = Some(Decimal::from(5)));
    bridge.handle(LifecycleSignal::Hidden).await;
    assert!(!bridge.is_visible());
    assert_eq!(backend.settings_writes(), 1);
    assert!(a.backups.list().is_empty());

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(a.backups.list().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unload_saves_even_when_the_backup_cannot_be_stored() {
    let backend = ScriptedBackend::new();
    let a = app_with_kv(
        backend.clone(),
        KeyValueStore::in_memory(64),
        config(DisplayMode::Browser),
    );
    let (tx, _rx) = mpsc::unbounded_channel();
    let bridge = a.bridge(tx);

    a.coordinator.update(|s| s.savings_percentage = Some(Decimal::ZERO));
    bridge.handle(LifecycleSignal::PageHide).await;

    assert_eq!(backend.settings_writes(), 1);
    let stored = a.gateway.read_settings().await.unwrap();
    assert_eq!(stored.savings_percentage, Some(Decimal::ZERO));
    assert!(a.backups.list().is_empty());
    assert!(!a.gateway.flat_store().contains(keys::EMERGENCY_STATE));
}

#[tokio::test(start_paused = true)]
async fn unload_leaves_a_state_dump() {
    let a = app(ScriptedBackend::new(), DisplayMode::Browser);
    let (tx, _rx) = mpsc::unbounded_channel();
    let bridge = a.bridge(tx);

    bridge.handle(LifecycleSignal::BeforeUnload).await;
    assert!(a.gateway.flat_store().contains(keys::EMERGENCY_STATE));
    assert_eq!(a.backups.list().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn periodic_backups_only_run_while_visible() {
    let a = app(ScriptedBackend::new(), DisplayMode::Browser);
    let (tx, _rx) = mpsc::unbounded_channel();
    let bridge = a.bridge(tx);
    a.coordinator.save_now().await.unwrap();

    bridge.handle(LifecycleSignal::PeriodicTick).await;
    assert_eq!(a.backups.list().len(), 1);

    bridge.handle(LifecycleSignal::Hidden).await;
    sleep(Duration::from_secs(2)).await;
    assert_eq!(a.backups.list().len(), 2);

    bridge.handle(LifecycleSignal::PeriodicTick).await;
    assert_eq!(a.backups.list().len(), 2);

    bridge.handle(LifecycleSignal::Visible).await;
    assert!(bridge.is_visible());
    bridge.handle(LifecycleSignal::PeriodicTick).await;
    assert_eq!(a.backups.list().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn host_messages_are_answered() {
    let a = app(ScriptedBackend::new(), DisplayMode::Browser);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let bridge = a.bridge(tx);

    bridge
        .handle(LifecycleSignal::Host(HostMessage::PrepareForUpdate))
        .await;
    assert_eq!(rx.recv().await, Some(HostReply::UpdateReady));
    assert_eq!(a.backups.list().len(), 1);

    bridge.handle(LifecycleSignal::Host(HostMessage::ForceSave)).await;
    assert_eq!(rx.recv().await, Some(HostReply::Saved { ok: true }));

    bridge
        .handle(LifecycleSignal::Host(HostMessage::CreateBackup))
        .await;
    assert_eq!(rx.recv().await, Some(HostReply::BackupCreated { ok: true }));

    bridge
        .handle(LifecycleSignal::Host(HostMessage::HealthCheck))
        .await;
    match rx.recv().await {
        Some(HostReply::Health {
            backend,
            saving,
            last_saved_at,
        }) => {
            assert_eq!(backend, ActiveBackend::Structured);
            assert!(!saving);
            assert!(last_saved_at.is_some());
        }
        other => panic!("unexpected reply {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn event_loop_acknowledges_and_ticks() {
    let a = app(ScriptedBackend::new(), DisplayMode::Browser);
    let (reply_tx, mut replies) = mpsc::unbounded_channel();
    let (signal_tx, signals) = mpsc::unbounded_channel();
    let handle = a.bridge(reply_tx).spawn(signals);

    assert_eq!(replies.recv().await, Some(HostReply::Ready));
    a.coordinator.save_now().await.unwrap();

    sleep(Duration::from_secs(10 * 60 + 1)).await;
    assert_eq!(a.backups.list().len(), 1);

    signal_tx
        .send(LifecycleSignal::Host(HostMessage::HealthCheck))
        .unwrap();
    assert!(matches!(replies.recv().await, Some(HostReply::Health { .. })));

    drop(signal_tx);
    handle.await.unwrap();
}

#[test]
fn replies_serialize_with_a_type_tag() {
    let health = HostReply::Health {
        backend: ActiveBackend::Fallback,
        saving: false,
        last_saved_at: None,
    };
    assert_eq!(
        serde_json::to_value(&health).unwrap(),
        json!({"type": "health", "backend": "fallback", "saving": false, "lastSavedAt": null})
    );
    assert_eq!(
        serde_json::to_value(HostReply::UpdateReady).unwrap(),
        json!({"type": "updateReady"})
    );
}
