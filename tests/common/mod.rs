// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use budgetvault::config::{DisplayMode, PersistenceConfig};
use budgetvault::db::App;
use budgetvault::error::StoreError;
use budgetvault::models::Collection;
use budgetvault::store::{BackendConnector, KeyValueStore, MemoryBackend, StructuredBackend};

pub const KV_QUOTA: usize = 1 << 20;

pub fn config(mode: DisplayMode) -> PersistenceConfig {
    PersistenceConfig {
        display_mode: mode,
        ..PersistenceConfig::default()
    }
}

/// Memory backend with switches for failing and lossy settings writes.
#[derive(Default)]
pub struct ScriptedBackend {
    inner: MemoryBackend,
    settings_writes: AtomicUsize,
    fail_writes: AtomicBool,
    failing_writes: AtomicUsize,
    lossy_writes: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Settings writes attempted so far, failed ones included.
    pub fn settings_writes(&self) -> usize {
        self.settings_writes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The next `n` settings writes fail, later ones go through.
    pub fn fail_next(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// The next `n` settings writes drop `savingsPercentage`.
    pub fn lose_savings_percentage(&self, n: usize) {
        self.lossy_writes.store(n, Ordering::SeqCst);
    }

    fn filter(&self, collection: Collection, json: String) -> Result<String, StoreError> {
        if collection == Collection::Settings {
            self.settings_writes.fetch_add(1, Ordering::SeqCst);
        }
        let refused = self.fail_writes.load(Ordering::SeqCst)
            || (collection == Collection::Settings
                && self
                    .failing_writes
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok());
        if refused {
            return Err(StoreError::Unavailable("write refused".into()));
        }
        let lossy = collection == Collection::Settings
            && self
                .lossy_writes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if !lossy {
            return Ok(json);
        }
        let mut value: Value = serde_json::from_str(&json)?;
        value["savingsPercentage"] = Value::Null;
        Ok(value.to_string())
    }
}

#[async_trait]
impl StructuredBackend for ScriptedBackend {
    async fn add(&self, collection: Collection, id: i64, json: String) -> Result<(), StoreError> {
        let json = self.filter(collection, json)?;
        self.inner.add(collection, id, json).await
    }

    async fn put(&self, collection: Collection, id: i64, json: String) -> Result<(), StoreError> {
        let json = self.filter(collection, json)?;
        self.inner.put(collection, id, json).await
    }

    async fn delete(&self, collection: Collection, id: i64) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        self.inner.get_all(collection).await
    }
}

/// Hands out one `ScriptedBackend` and counts connects.
pub struct ScriptedConnector {
    backend: Arc<ScriptedBackend>,
    connects: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(backend: Arc<ScriptedBackend>) -> Arc<Self> {
        Arc::new(Self {
            backend,
            connects: AtomicUsize::new(0),
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendConnector for ScriptedConnector {
    async fn connect(&self) -> Result<Arc<dyn StructuredBackend>, StoreError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let backend: Arc<dyn StructuredBackend> = self.backend.clone();
        Ok(backend)
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Every connect fails.
#[derive(Default)]
pub struct FailingConnector {
    connects: AtomicUsize,
}

impl FailingConnector {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendConnector for FailingConnector {
    async fn connect(&self) -> Result<Arc<dyn StructuredBackend>, StoreError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("blocked by the host".into()))
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}

/// Never answers.
pub struct HangingConnector;

#[async_trait]
impl BackendConnector for HangingConnector {
    async fn connect(&self) -> Result<Arc<dyn StructuredBackend>, StoreError> {
        std::future::pending().await
    }

    fn describe(&self) -> String {
        "hanging".to_string()
    }
}

pub fn app_with_kv(backend: Arc<ScriptedBackend>, kv: KeyValueStore, config: PersistenceConfig) -> App {
    let connector: Arc<dyn BackendConnector> = ScriptedConnector::new(backend);
    App::with_parts(Some(connector), kv, config)
}

/// Like `app`, but hands back the connector so tests can count reconnects.
pub fn app_with_connector(backend: Arc<ScriptedBackend>, mode: DisplayMode) -> (App, Arc<ScriptedConnector>) {
    let scripted = ScriptedConnector::new(backend);
    let connector: Arc<dyn BackendConnector> = scripted.clone();
    let app = App::with_parts(Some(connector), KeyValueStore::in_memory(KV_QUOTA), config(mode));
    (app, scripted)
}

pub fn app(backend: Arc<ScriptedBackend>, mode: DisplayMode) -> App {
    app_with_kv(backend, KeyValueStore::in_memory(KV_QUOTA), config(mode))
}
