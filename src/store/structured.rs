// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Asynchronous multi-collection backend contract and the bounded open.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::Collection;

/// Schema version declared on open. Bump when a collection is added.
pub const SCHEMA_VERSION: i64 = 1;

/// One open handle on the structured database. Records travel as JSON text
/// keyed by their `id`.
#[async_trait]
pub trait StructuredBackend: Send + Sync {
    /// Insert; an existing id is `StoreError::Conflict`.
    async fn add(&self, collection: Collection, id: i64, json: String) -> Result<(), StoreError>;

    /// Insert or replace.
    async fn put(&self, collection: Collection, id: i64, json: String) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: i64) -> Result<(), StoreError>;

    /// All records of a collection ordered by id.
    async fn get_all(&self, collection: Collection) -> Result<Vec<String>, StoreError>;
}

/// Produces backend handles. Connecting declares the schema.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn StructuredBackend>, StoreError>;

    fn describe(&self) -> String;
}

/// Connects with a bounded wait. A backend that errors or does not answer in
/// time resolves to `None`.
pub async fn open(
    connector: &dyn BackendConnector,
    timeout: Duration,
) -> Option<Arc<dyn StructuredBackend>> {
    match tokio::time::timeout(timeout, connector.connect()).await {
        Ok(Ok(handle)) => {
            tracing::info!(backend = %connector.describe(), "structured backend opened");
            Some(handle)
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = %connector.describe(), error = %e, "structured backend failed to open");
            None
        }
        Err(_) => {
            tracing::warn!(
                backend = %connector.describe(),
                timeout_ms = timeout.as_millis() as u64,
                "structured backend did not open in time"
            );
            None
        }
    }
}
