// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::PersistenceConfig;
use crate::error::PersistenceError;
use crate::gateway::PersistenceGateway;
use crate::models::BackupSnapshot;
use crate::store::keys;

/// Live data is missing something the newest backup still has.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLossWarning {
    pub backup_created_at: DateTime<Utc>,
    pub settings_missing: bool,
    pub backup_transactions: usize,
    pub live_transactions: usize,
}

fn is_empty(s: &BackupSnapshot) -> bool {
    s.settings.is_none()
        && s.transactions.is_empty()
        && s.fixed_expenses.is_empty()
        && s.future_expenses.is_empty()
        && s.savings.is_empty()
}

/// Full-state copies kept in the flat store, independent of the primary backend.
///
/// While a data-loss warning is outstanding, new backups and dumps are held
/// back so the suspect state cannot displace the copies that still have the data.
pub struct BackupManager {
    gateway: Arc<PersistenceGateway>,
    retention: usize,
    loss_suspected: AtomicBool,
}

impl BackupManager {
    pub fn new(gateway: Arc<PersistenceGateway>, config: &PersistenceConfig) -> Self {
        Self {
            gateway,
            retention: config.backup_retention.max(1),
            loss_suspected: AtomicBool::new(false),
        }
    }

    pub fn loss_suspected(&self) -> bool {
        self.loss_suspected.load(Ordering::Acquire)
    }

    /// The user chose to keep the current state; backups resume.
    pub fn acknowledge_loss(&self) {
        self.loss_suspected.store(false, Ordering::Release);
    }

    /// Backup ring, newest first.
    pub fn list(&self) -> Vec<BackupSnapshot> {
        self.gateway
            .flat_store()
            .get::<Vec<BackupSnapshot>>(keys::BACKUPS)
            .unwrap_or_default()
    }

    /// Newest of the ring head and the emergency full-state dump.
    pub fn latest(&self) -> Option<BackupSnapshot> {
        let ring_head = self.list().into_iter().next();
        let dump = self
            .gateway
            .flat_store()
            .get::<BackupSnapshot>(keys::EMERGENCY_STATE);
        match (ring_head, dump) {
            (Some(a), Some(b)) => Some(if b.created_at > a.created_at { b } else { a }),
            (a, b) => a.or(b),
        }
    }

    /// Pushes the current state onto the ring. An empty export never displaces
    /// an existing backup; `Ok(None)` reports that skip.
    pub async fn create(&self) -> Result<Option<BackupSnapshot>, PersistenceError> {
        if self.loss_suspected() {
            tracing::warn!("backup held back while a data-loss warning is outstanding");
            return Ok(None);
        }
        let snapshot = self.gateway.export_snapshot().await;
        if is_empty(&snapshot) {
            tracing::debug!("nothing to back up");
            return Ok(None);
        }

        let mut ring = self.list();
        ring.insert(0, snapshot.clone());
        ring.truncate(self.retention);

        // Shrink the ring until the flat store accepts it.
        loop {
            if self.gateway.flat_store().set(keys::BACKUPS, &ring) {
                tracing::info!(kept = ring.len(), created_at = %snapshot.created_at, "backup created");
                return Ok(Some(snapshot));
            }
            if ring.len() <= 1 {
                break;
            }
            ring.pop();
        }
        Err(PersistenceError::BackendUnavailable(
            "backup could not be stored in the flat store".into(),
        ))
    }

    pub async fn restore_latest(&self) -> Result<BackupSnapshot, PersistenceError> {
        let Some(snapshot) = self.latest() else {
            return Err(PersistenceError::BackendUnavailable("no backup available".into()));
        };
        if !self.gateway.import_snapshot(&snapshot).await {
            return Err(PersistenceError::BackendUnavailable(
                "backup could not be written back".into(),
            ));
        }
        // Settings snapshots taken after the backup would shadow it on the next load.
        let kv = self.gateway.flat_store();
        kv.remove(keys::CURRENT_SETTINGS);
        kv.remove(keys::EMERGENCY_SETTINGS);
        self.acknowledge_loss();
        tracing::info!(created_at = %snapshot.created_at, "backup restored");
        Ok(snapshot)
    }

    /// Full-state dump for the moment the app is about to go away.
    pub async fn emergency_dump(&self) -> bool {
        if self.loss_suspected() {
            return false;
        }
        let snapshot = self.gateway.export_snapshot().await;
        if is_empty(&snapshot) {
            return false;
        }
        self.gateway
            .flat_store()
            .set(keys::EMERGENCY_STATE, &snapshot)
    }

    /// Load-time check for lost settings or transactions.
    pub async fn assess(&self) -> Option<DataLossWarning> {
        let backup = self.latest()?;
        let live = self.gateway.export_snapshot().await;

        let backup_configured = backup.settings.as_ref().is_some_and(|s| s.setup_complete);
        let live_configured = live.settings.as_ref().is_some_and(|s| s.setup_complete);
        let settings_missing = backup_configured && !live_configured;
        let transactions_lost = !backup.transactions.is_empty() && live.transactions.is_empty();

        if !settings_missing && !transactions_lost {
            return None;
        }
        let warning = DataLossWarning {
            backup_created_at: backup.created_at,
            settings_missing,
            backup_transactions: backup.transactions.len(),
            live_transactions: live.transactions.len(),
        };
        tracing::warn!(?warning, "possible data loss detected");
        self.loss_suspected.store(true, Ordering::Release);
        Some(warning)
    }
}
