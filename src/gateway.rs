// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! One CRUD contract per collection over whichever backend was negotiated.
//!
//! The first operation opens the structured backend (bounded by the open
//! timeout). If that fails the gateway latches onto the flat store for the
//! rest of the process. Public methods never return errors: reads degrade to
//! empty results and writes to `false`, with a logged diagnostic.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::PersistenceConfig;
use crate::error::StoreError;
use crate::models::{
    BACKUP_FORMAT_VERSION, BackupSnapshot, FixedExpense, FutureExpense, Record, SETTINGS_ID,
    SavingsEntry, Settings, Transaction,
};
use crate::store::keys;
use crate::store::structured::{self, BackendConnector, StructuredBackend};
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Add,
    Upsert,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveBackend {
    Pending,
    Structured,
    Fallback,
}

impl fmt::Display for ActiveBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActiveBackend::Pending => "pending",
            ActiveBackend::Structured => "structured",
            ActiveBackend::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

enum Negotiation {
    Pending,
    Structured(Arc<dyn StructuredBackend>),
    Fallback,
}

impl Negotiation {
    fn active(&self) -> ActiveBackend {
        match self {
            Negotiation::Pending => ActiveBackend::Pending,
            Negotiation::Structured(_) => ActiveBackend::Structured,
            Negotiation::Fallback => ActiveBackend::Fallback,
        }
    }
}

enum Route {
    Structured(Arc<dyn StructuredBackend>),
    Flat,
}

pub struct PersistenceGateway {
    connector: Option<Arc<dyn BackendConnector>>,
    kv: KeyValueStore,
    open_timeout: Duration,
    state: Mutex<Negotiation>,
}

impl PersistenceGateway {
    /// `connector == None` means the host has no structured backend at all.
    pub fn new(
        connector: Option<Arc<dyn BackendConnector>>,
        kv: KeyValueStore,
        config: &PersistenceConfig,
    ) -> Self {
        Self {
            connector,
            kv,
            open_timeout: config.open_timeout,
            state: Mutex::new(Negotiation::Pending),
        }
    }

    pub fn flat_store(&self) -> &KeyValueStore {
        &self.kv
    }

    /// Current latch state without triggering negotiation.
    pub async fn backend(&self) -> ActiveBackend {
        self.state.lock().await.active()
    }

    /// Runs negotiation if it has not happened yet.
    pub async fn ensure_ready(&self) -> ActiveBackend {
        let _ = self.route().await;
        self.backend().await
    }

    /// Reconnects a structured handle after a failed write. A failed
    /// reconnect latches the flat store; a latched flat store stays latched.
    pub async fn reinitialize(&self) -> ActiveBackend {
        let mut state = self.state.lock().await;
        if matches!(*state, Negotiation::Fallback) {
            return ActiveBackend::Fallback;
        }
        *state = self.negotiate().await;
        tracing::info!(backend = %state.active(), "backend negotiation reinitialized");
        state.active()
    }

    async fn negotiate(&self) -> Negotiation {
        let Some(connector) = &self.connector else {
            tracing::info!("no structured backend available; using flat store");
            return Negotiation::Fallback;
        };
        match structured::open(connector.as_ref(), self.open_timeout).await {
            Some(handle) => Negotiation::Structured(handle),
            None => {
                tracing::warn!("structured backend unavailable; flat store latched for this session");
                Negotiation::Fallback
            }
        }
    }

    /// Single-flight: concurrent first callers wait on the same lock and
    /// observe one negotiation result.
    async fn route(&self) -> Route {
        let mut state = self.state.lock().await;
        if matches!(*state, Negotiation::Pending) {
            *state = self.negotiate().await;
        }
        match &*state {
            Negotiation::Structured(handle) => Route::Structured(handle.clone()),
            _ => Route::Flat,
        }
    }

    pub async fn read<R: Record>(&self) -> Vec<R> {
        match self.try_read::<R>().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    collection = R::COLLECTION.name(),
                    error = %e,
                    "read failed; returning empty list"
                );
                Vec::new()
            }
        }
    }

    pub async fn read_settings(&self) -> Option<Settings> {
        pick_settings(self.read::<Settings>().await)
    }

    pub(crate) async fn try_read_settings(&self) -> Result<Option<Settings>, StoreError> {
        Ok(pick_settings(self.try_read::<Settings>().await?))
    }

    pub(crate) async fn try_read<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let collection = R::COLLECTION;
        Ok(self
            .raw_rows::<R>()
            .await?
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<R>(v) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!(collection = collection.name(), error = %e, "skipping undecodable record");
                    None
                }
            })
            .collect())
    }

    async fn raw_rows<R: Record>(&self) -> Result<Vec<Value>, StoreError> {
        let collection = R::COLLECTION;
        match self.route().await {
            Route::Structured(handle) => {
                let raw = handle.get_all(collection).await?;
                Ok(raw
                    .iter()
                    .filter_map(|s| match serde_json::from_str(s) {
                        Ok(v) => Some(v),
                        Err(e) => {
                            tracing::warn!(collection = collection.name(), error = %e, "skipping unreadable row");
                            None
                        }
                    })
                    .collect())
            }
            Route::Flat => Ok(self.flat_rows::<R>()),
        }
    }

    pub async fn write<R: Record>(&self, item: &R, mode: WriteMode) -> bool {
        match self.try_write(item, mode).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    collection = R::COLLECTION.name(),
                    id = item.id(),
                    mode = ?mode,
                    error = %e,
                    "write failed"
                );
                false
            }
        }
    }

    pub async fn delete<R: Record>(&self, id: i64) -> bool {
        match self.try_delete::<R>(id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(collection = R::COLLECTION.name(), id, error = %e, "delete failed");
                false
            }
        }
    }

    pub(crate) async fn try_write<R: Record>(&self, item: &R, mode: WriteMode) -> Result<(), StoreError> {
        if mode == WriteMode::Delete {
            return self.try_delete::<R>(item.id()).await;
        }
        let collection = R::COLLECTION;
        match self.route().await {
            Route::Structured(handle) => {
                let json = serde_json::to_string(item)?;
                match mode {
                    WriteMode::Add => handle.add(collection, item.id(), json).await,
                    _ => handle.put(collection, item.id(), json).await,
                }
            }
            // The flat store has no uniqueness constraint: add behaves as upsert.
            Route::Flat => {
                let value = serde_json::to_value(item)?;
                let mut rows = self.flat_rows::<R>();
                match rows.iter_mut().find(|v| row_id(v) == Some(item.id())) {
                    Some(slot) => *slot = value,
                    None => rows.push(value),
                }
                rows.sort_by_key(|v| row_id(v).unwrap_or(i64::MAX));
                self.store_flat_rows::<R>(&rows)
            }
        }
    }

    async fn try_delete<R: Record>(&self, id: i64) -> Result<(), StoreError> {
        match self.route().await {
            Route::Structured(handle) => handle.delete(R::COLLECTION, id).await,
            Route::Flat => {
                let mut rows = self.flat_rows::<R>();
                rows.retain(|v| row_id(v) != Some(id));
                self.store_flat_rows::<R>(&rows)
            }
        }
    }

    fn flat_rows<R: Record>(&self) -> Vec<Value> {
        self.kv
            .get::<Vec<Value>>(&keys::collection(R::COLLECTION))
            .unwrap_or_default()
    }

    fn store_flat_rows<R: Record>(&self, rows: &[Value]) -> Result<(), StoreError> {
        let key = keys::collection(R::COLLECTION);
        if self.kv.set(&key, rows) {
            Ok(())
        } else {
            Err(StoreError::FlatWrite(key))
        }
    }

    /// Every collection as one backup snapshot.
    pub async fn export_snapshot(&self) -> BackupSnapshot {
        BackupSnapshot {
            version: BACKUP_FORMAT_VERSION,
            created_at: Utc::now(),
            settings: self.read_settings().await,
            transactions: self.read::<Transaction>().await,
            fixed_expenses: self.read::<FixedExpense>().await,
            future_expenses: self.read::<FutureExpense>().await,
            savings: self.read::<SavingsEntry>().await,
        }
    }

    /// Replaces every collection with the snapshot's contents.
    pub async fn import_snapshot(&self, snapshot: &BackupSnapshot) -> bool {
        let settings: Vec<Settings> = snapshot.settings.iter().cloned().collect();
        let results = [
            self.replace_all(&settings).await,
            self.replace_all(&snapshot.transactions).await,
            self.replace_all(&snapshot.fixed_expenses).await,
            self.replace_all(&snapshot.future_expenses).await,
            self.replace_all(&snapshot.savings).await,
        ];
        let mut ok = true;
        for r in results {
            if let Err(e) = r {
                tracing::warn!(error = %e, "snapshot import incomplete");
                ok = false;
            }
        }
        ok
    }

    /// Rows that no longer decode are replaced too. On the structured
    /// backend a row that is not JSON at all has no id and stays behind.
    async fn replace_all<R: Record>(&self, records: &[R]) -> Result<(), StoreError> {
        match self.route().await {
            Route::Structured(handle) => {
                let stale: Vec<i64> = self
                    .raw_rows::<R>()
                    .await?
                    .iter()
                    .filter_map(row_id)
                    .filter(|id| !records.iter().any(|r| r.id() == *id))
                    .collect();
                for id in stale {
                    handle.delete(R::COLLECTION, id).await?;
                }
                for record in records {
                    handle
                        .put(R::COLLECTION, record.id(), serde_json::to_string(record)?)
                        .await?;
                }
                Ok(())
            }
            Route::Flat => {
                let mut rows = records
                    .iter()
                    .map(serde_json::to_value)
                    .collect::<Result<Vec<_>, _>>()?;
                rows.sort_by_key(|v| row_id(v).unwrap_or(i64::MAX));
                self.store_flat_rows::<R>(&rows)
            }
        }
    }
}

fn row_id(v: &Value) -> Option<i64> {
    v.get("id").and_then(Value::as_i64)
}

fn pick_settings(mut all: Vec<Settings>) -> Option<Settings> {
    match all.iter().position(|s| s.id == SETTINGS_ID) {
        Some(i) => Some(all.swap_remove(i)),
        None => all.into_iter().next(),
    }
}
