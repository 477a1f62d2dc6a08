// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Maps host lifecycle signals onto saves and backups.
//!
//! | signal                    | action                                        |
//! |---------------------------|-----------------------------------------------|
//! | `Hidden`                  | immediate save, backup after `backup_delay`    |
//! | `Visible`                 | throttled verification save                   |
//! | `PageHide`/`BeforeUnload` | immediate save, then state dump and backup    |
//! | `PeriodicTick`            | backup only, while visible                    |
//! | `Host(PrepareForUpdate)`  | save and backup, then `UpdateReady`           |

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::backup::BackupManager;
use crate::config::PersistenceConfig;
use crate::coordinator::{SaveOutcome, SettingsSaveCoordinator};
use crate::gateway::ActiveBackend;

/// Named requests from the background update agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostMessage {
    PrepareForUpdate,
    ForceSave,
    CreateBackup,
    HealthCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    Hidden,
    Visible,
    PageHide,
    BeforeUnload,
    PeriodicTick,
    Host(HostMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostReply {
    Ready,
    UpdateReady,
    Saved { ok: bool },
    BackupCreated { ok: bool },
    #[serde(rename_all = "camelCase")]
    Health {
        backend: ActiveBackend,
        saving: bool,
        last_saved_at: Option<DateTime<Utc>>,
    },
}

pub struct LifecycleBridge {
    coordinator: Arc<SettingsSaveCoordinator>,
    backups: Arc<BackupManager>,
    replies: mpsc::UnboundedSender<HostReply>,
    visible: AtomicBool,
    backup_delay: Duration,
    backup_interval: Duration,
}

impl LifecycleBridge {
    pub fn new(
        coordinator: Arc<SettingsSaveCoordinator>,
        backups: Arc<BackupManager>,
        config: &PersistenceConfig,
        replies: mpsc::UnboundedSender<HostReply>,
    ) -> Self {
        Self {
            coordinator,
            backups,
            replies,
            visible: AtomicBool::new(true),
            backup_delay: config.backup_delay,
            backup_interval: config.backup_interval,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    fn reply(&self, reply: HostReply) {
        if self.replies.send(reply).is_err() {
            tracing::debug!("host reply channel closed");
        }
    }

    async fn save(&self, reason: &'static str) -> bool {
        match self.coordinator.save_now().await {
            Ok(outcome) => {
                tracing::debug!(reason, ?outcome, "lifecycle save");
                true
            }
            Err(e) => {
                tracing::warn!(reason, error = %e, "lifecycle save failed");
                false
            }
        }
    }

    async fn backup(&self) -> bool {
        match self.backups.create().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "lifecycle backup failed");
                false
            }
        }
    }

    pub async fn handle(&self, signal: LifecycleSignal) {
        tracing::debug!(?signal, "lifecycle signal");
        match signal {
            LifecycleSignal::Hidden => {
                self.visible.store(false, Ordering::Release);
                self.save("hidden").await;
                let backups = Arc::clone(&self.backups);
                let delay = self.backup_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Err(e) = backups.create().await {
                        tracing::warn!(error = %e, "delayed backup failed");
                    }
                });
            }
            LifecycleSignal::Visible => {
                self.visible.store(true, Ordering::Release);
                match self.coordinator.verification_save().await {
                    Ok(SaveOutcome::Skipped) => tracing::debug!("verification save throttled"),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "verification save failed"),
                }
            }
            LifecycleSignal::PageHide | LifecycleSignal::BeforeUnload => {
                self.visible.store(false, Ordering::Release);
                // Save first: the backup may be cut short by the unload.
                self.save("unload").await;
                if !self.backups.emergency_dump().await {
                    tracing::debug!("no emergency state dump written");
                }
                self.backup().await;
            }
            LifecycleSignal::PeriodicTick => {
                if self.is_visible() {
                    self.backup().await;
                }
            }
            LifecycleSignal::Host(HostMessage::PrepareForUpdate) => {
                self.save("update").await;
                self.backup().await;
                self.reply(HostReply::UpdateReady);
            }
            LifecycleSignal::Host(HostMessage::ForceSave) => {
                let ok = self.save("forced").await;
                self.reply(HostReply::Saved { ok });
            }
            LifecycleSignal::Host(HostMessage::CreateBackup) => {
                let ok = self.backup().await;
                self.reply(HostReply::BackupCreated { ok });
            }
            LifecycleSignal::Host(HostMessage::HealthCheck) => {
                let backend = self.coordinator.gateway().backend().await;
                self.reply(HostReply::Health {
                    backend,
                    saving: self.coordinator.is_saving(),
                    last_saved_at: self.coordinator.last_saved_at(),
                });
            }
        }
    }

    /// Event loop: acknowledges readiness, then handles signals in arrival
    /// order and ticks the periodic backup. Ends when the sender is dropped.
    pub fn spawn(self: Arc<Self>, mut signals: mpsc::UnboundedReceiver<LifecycleSignal>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.reply(HostReply::Ready);
            let mut ticker = tokio::time::interval_at(Instant::now() + self.backup_interval, self.backup_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    signal = signals.recv() => match signal {
                        Some(signal) => self.handle(signal).await,
                        None => break,
                    },
                    _ = ticker.tick() => self.handle(LifecycleSignal::PeriodicTick).await,
                }
            }
        })
    }
}
