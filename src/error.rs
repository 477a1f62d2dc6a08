// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Failures of the flat key-value namespace. Never escapes `KeyValueStore`.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("flat store quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("flat store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("flat store payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("flat store lock poisoned")]
    Poisoned,
}

/// Failures of a structured backend operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("structured backend unavailable: {0}")]
    Unavailable(String),
    #[error("record {id} already exists in {collection}")]
    Conflict { collection: &'static str, id: i64 },
    #[error("record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("flat store rejected the write to {0}")]
    FlatWrite(String),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("backend task failed: {0}")]
    Task(String),
}

/// What the save path reports to its callers.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("persistence backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("read-back mismatch on savings percentage: expected {expected:?}, found {found:?}")]
    VerificationMismatch {
        expected: Option<Decimal>,
        found: Option<Decimal>,
    },
    #[error("settings could not be persisted after {attempts} attempts; emergency snapshot written")]
    TerminalPersistenceFailure { attempts: u32 },
}

impl PersistenceError {
    /// Whether the coordinator may still recover from this error on its own.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PersistenceError::TerminalPersistenceFailure { .. })
    }
}
