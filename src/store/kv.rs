// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Flat, synchronous, string-keyed store with a byte quota.
//!
//! `FlatStorage` is the raw namespace; `KeyValueStore` layers JSON on top and
//! turns every failure into `None`/`false` so callers can treat an unpersisted
//! value as "retry later".

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::KvError;

pub trait FlatStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, KvError>;
    fn write(&self, key: &str, value: &str) -> Result<(), KvError>;
    fn remove(&self, key: &str) -> Result<(), KvError>;
    fn keys(&self) -> Result<Vec<String>, KvError>;
}

fn usage(map: &BTreeMap<String, String>) -> usize {
    map.iter().map(|(k, v)| k.len() + v.len()).sum()
}

fn check_quota(
    map: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    quota: usize,
) -> Result<(), KvError> {
    let current = usage(map);
    let replaced = map.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
    let needed = current - replaced + key.len() + value.len();
    if needed > quota {
        return Err(KvError::QuotaExceeded { needed, quota });
    }
    Ok(())
}

/// In-process namespace.
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
    quota: usize,
}

impl MemoryStorage {
    pub fn new(quota: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota,
        }
    }
}

impl FlatStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, KvError> {
        let entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        check_quota(&entries, key, value, self.quota)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, KvError> {
        let entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

/// Namespace persisted as one JSON object file. Writes go through a
/// temporary sibling and a rename so a crash leaves the previous file intact.
pub struct FileStorage {
    path: PathBuf,
    quota: usize,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>, quota: usize) -> Result<Self, KvError> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                match serde_json::from_str(&raw) {
                    Ok(entries) => entries,
                    Err(e) => {
                        set_aside(&path, &e);
                        BTreeMap::new()
                    }
                }
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            quota,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), KvError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.partial");
        fs::write(&tmp, serde_json::to_vec(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Moves an unreadable store file out of the way so the session can start
/// empty instead of failing every command.
fn set_aside(path: &Path, error: &serde_json::Error) {
    let aside = path.with_extension(format!("json.corrupt-{}", Utc::now().timestamp()));
    tracing::warn!(
        path = %path.display(),
        moved_to = %aside.display(),
        error = %error,
        "flat store file is corrupt; starting empty"
    );
    if let Err(e) = fs::rename(path, &aside) {
        tracing::warn!(path = %path.display(), error = %e, "could not move corrupt flat store file aside");
    }
}

impl FlatStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, KvError> {
        let entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        check_quota(&entries, key, value, self.quota)?;
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&entries) {
            match previous {
                Some(p) => entries.insert(key.to_string(), p),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        if let Some(previous) = entries.remove(key) {
            if let Err(e) = self.flush(&entries) {
                entries.insert(key.to_string(), previous);
                return Err(e);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, KvError> {
        let entries = self.entries.lock().map_err(|_| KvError::Poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

/// JSON view over a `FlatStorage`. Never returns an error.
#[derive(Clone)]
pub struct KeyValueStore {
    storage: Arc<dyn FlatStorage>,
}

impl KeyValueStore {
    pub fn new(storage: Arc<dyn FlatStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory(quota: usize) -> Self {
        Self::new(Arc::new(MemoryStorage::new(quota)))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "flat store read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(key, error = %e, "flat store value could not be decoded");
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "flat store value could not be encoded");
                return false;
            }
        };
        match self.storage.write(key, &raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "flat store write failed");
                false
            }
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        match self.storage.remove(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "flat store remove failed");
                false
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.storage.read(key), Ok(Some(_)))
    }

    pub fn keys(&self) -> Vec<String> {
        self.storage.keys().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "flat store key listing failed");
            Vec::new()
        })
    }
}
