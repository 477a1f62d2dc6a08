// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode};
use tokio::task;

use super::structured::{BackendConnector, SCHEMA_VERSION, StructuredBackend};
use crate::error::StoreError;
use crate::models::Collection;

pub const DB_FILE_NAME: &str = "budgetvault.sqlite";

#[derive(Debug, Clone)]
pub enum SqliteTarget {
    File(PathBuf),
    /// Private in-memory database shared by every handle of one connector.
    Memory,
}

pub struct SqliteConnector {
    target: SqliteTarget,
    memory: Mutex<Option<Arc<Mutex<Connection>>>>,
}

impl SqliteConnector {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            target: SqliteTarget::File(path.into()),
            memory: Mutex::new(None),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            target: SqliteTarget::Memory,
            memory: Mutex::new(None),
        }
    }

    fn open_memory(&self) -> Result<Arc<Mutex<Connection>>, StoreError> {
        let mut slot = self
            .memory
            .lock()
            .map_err(|_| StoreError::Task("connector lock poisoned".into()))?;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let mut conn = Connection::open_in_memory()?;
        init_schema(&mut conn)?;
        let conn = Arc::new(Mutex::new(conn));
        *slot = Some(conn.clone());
        Ok(conn)
    }
}

fn open_file(path: PathBuf) -> Result<Arc<Mutex<Connection>>, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable(e.to_string()))?;
    }
    let mut conn = Connection::open(&path)?;
    init_schema(&mut conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

#[async_trait]
impl BackendConnector for SqliteConnector {
    async fn connect(&self) -> Result<Arc<dyn StructuredBackend>, StoreError> {
        let conn = match &self.target {
            SqliteTarget::File(path) => {
                let path = path.clone();
                task::spawn_blocking(move || open_file(path))
                    .await
                    .map_err(|e| StoreError::Task(e.to_string()))??
            }
            SqliteTarget::Memory => self.open_memory()?,
        };
        Ok(Arc::new(SqliteBackend { conn }))
    }

    fn describe(&self) -> String {
        match &self.target {
            SqliteTarget::File(path) => format!("sqlite:{}", path.display()),
            SqliteTarget::Memory => "sqlite::memory:".to_string(),
        }
    }
}

/// Declares every collection. Safe to run against an existing database.
fn init_schema(conn: &mut Connection) -> Result<(), StoreError> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(StoreError::Unavailable(format!(
            "database schema version {} is newer than supported {}",
            version, SCHEMA_VERSION
        )));
    }
    let tx = conn.transaction()?;
    for collection in Collection::ALL {
        tx.execute_batch(&format!(
            r#"CREATE TABLE IF NOT EXISTS "{}"(
                id INTEGER PRIMARY KEY,
                data TEXT NOT NULL
            );"#,
            collection.name()
        ))?;
    }
    tx.execute_batch(&format!("PRAGMA user_version = {};", SCHEMA_VERSION))?;
    tx.commit()?;
    Ok(())
}

pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Task("connection lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl StructuredBackend for SqliteBackend {
    async fn add(&self, collection: Collection, id: i64, json: String) -> Result<(), StoreError> {
        self.run(move |conn| {
            let sql = format!(r#"INSERT INTO "{}"(id, data) VALUES (?1, ?2)"#, collection.name());
            match conn.execute(&sql, params![id, json]) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::Conflict {
                        collection: collection.name(),
                        id,
                    })
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn put(&self, collection: Collection, id: i64, json: String) -> Result<(), StoreError> {
        self.run(move |conn| {
            let sql = format!(
                r#"INSERT INTO "{}"(id, data) VALUES (?1, ?2)
                   ON CONFLICT(id) DO UPDATE SET data=excluded.data"#,
                collection.name()
            );
            conn.execute(&sql, params![id, json])?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: i64) -> Result<(), StoreError> {
        self.run(move |conn| {
            let sql = format!(r#"DELETE FROM "{}" WHERE id=?1"#, collection.name());
            conn.execute(&sql, params![id])?;
            Ok(())
        })
        .await
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        self.run(move |conn| {
            let sql = format!(r#"SELECT data FROM "{}" ORDER BY id"#, collection.name());
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(r) = rows.next()? {
                out.push(r.get::<_, String>(0)?);
            }
            Ok(out)
        })
        .await
    }
}
