// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::backup::BackupManager;
use crate::config::PersistenceConfig;
use crate::coordinator::SettingsSaveCoordinator;
use crate::gateway::PersistenceGateway;
use crate::lifecycle::{HostReply, LifecycleBridge};
use crate::store::sqlite::DB_FILE_NAME;
use crate::store::{keys, BackendConnector, FileStorage, KeyValueStore, SqliteConnector};

/// The persistence stack of one process, built once and shared by reference.
pub struct App {
    pub config: PersistenceConfig,
    pub gateway: Arc<PersistenceGateway>,
    pub coordinator: Arc<SettingsSaveCoordinator>,
    pub backups: Arc<BackupManager>,
}

impl App {
    pub fn with_parts(
        connector: Option<Arc<dyn BackendConnector>>,
        kv: KeyValueStore,
        config: PersistenceConfig,
    ) -> Self {
        let gateway = Arc::new(PersistenceGateway::new(connector, kv, &config));
        let coordinator = Arc::new(SettingsSaveCoordinator::new(gateway.clone(), config.clone()));
        let backups = Arc::new(BackupManager::new(gateway.clone(), &config));
        Self {
            config,
            gateway,
            coordinator,
            backups,
        }
    }

    pub fn bridge(&self, replies: mpsc::UnboundedSender<HostReply>) -> Arc<LifecycleBridge> {
        Arc::new(LifecycleBridge::new(
            self.coordinator.clone(),
            self.backups.clone(),
            &self.config,
            replies,
        ))
    }
}

pub fn db_path(config: &PersistenceConfig) -> Result<PathBuf> {
    Ok(config.resolve_data_dir()?.join(DB_FILE_NAME))
}

pub fn kv_path(config: &PersistenceConfig) -> Result<PathBuf> {
    Ok(config.resolve_data_dir()?.join(keys::KV_FILE_NAME))
}

/// File-backed flat store plus the SQLite structured backend in the data dir.
pub fn open_or_init(config: PersistenceConfig) -> Result<App> {
    let kv_file = kv_path(&config)?;
    let storage = FileStorage::open(&kv_file, config.kv_quota_bytes)
        .with_context(|| format!("Open flat store at {}", kv_file.display()))?;
    let connector: Arc<dyn BackendConnector> = Arc::new(SqliteConnector::file(db_path(&config)?));
    Ok(App::with_parts(
        Some(connector),
        KeyValueStore::new(Arc::new(storage)),
        config,
    ))
}
