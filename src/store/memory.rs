// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::structured::{BackendConnector, StructuredBackend};
use crate::error::StoreError;
use crate::models::Collection;

/// Structured backend held in process memory, with the same conflict rules
/// as the SQLite one.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<Collection, BTreeMap<i64, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_table<T>(
        &self,
        collection: Collection,
        f: impl FnOnce(&mut BTreeMap<i64, String>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Task("memory backend lock poisoned".into()))?;
        f(tables.entry(collection).or_default())
    }
}

#[async_trait]
impl StructuredBackend for MemoryBackend {
    async fn add(&self, collection: Collection, id: i64, json: String) -> Result<(), StoreError> {
        self.with_table(collection, |t| {
            if t.contains_key(&id) {
                return Err(StoreError::Conflict {
                    collection: collection.name(),
                    id,
                });
            }
            t.insert(id, json);
            Ok(())
        })
    }

    async fn put(&self, collection: Collection, id: i64, json: String) -> Result<(), StoreError> {
        self.with_table(collection, |t| {
            t.insert(id, json);
            Ok(())
        })
    }

    async fn delete(&self, collection: Collection, id: i64) -> Result<(), StoreError> {
        self.with_table(collection, |t| {
            t.remove(&id);
            Ok(())
        })
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        self.with_table(collection, |t| Ok(t.values().cloned().collect()))
    }
}

/// Hands out the same `MemoryBackend` on every connect.
#[derive(Default, Clone)]
pub struct MemoryConnector {
    backend: Arc<MemoryBackend>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(&self) -> Arc<MemoryBackend> {
        self.backend.clone()
    }
}

#[async_trait]
impl BackendConnector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn StructuredBackend>, StoreError> {
        Ok(self.backend.clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
