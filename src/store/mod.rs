// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod kv;
pub mod memory;
pub mod sqlite;
pub mod structured;

pub use kv::{FileStorage, FlatStorage, KeyValueStore, MemoryStorage};
pub use memory::{MemoryBackend, MemoryConnector};
pub use sqlite::{SqliteConnector, SqliteTarget};
pub use structured::{BackendConnector, StructuredBackend};

/// Flat-store key namespace.
pub mod keys {
    use crate::models::Collection;

    pub const KV_FILE_NAME: &str = "budgetvault-kv.json";

    /// Routine settings snapshot written before every standalone save.
    pub const CURRENT_SETTINGS: &str = "budgetvault.settings.current";
    /// Tagged settings written when every retry failed.
    pub const EMERGENCY_SETTINGS: &str = "budgetvault.settings.emergency";
    /// Full-state dump taken when the app is about to go away.
    pub const EMERGENCY_STATE: &str = "budgetvault.state.emergency";
    pub const BACKUPS: &str = "budgetvault.backups";

    /// Fallback key holding a whole collection.
    pub fn collection(c: Collection) -> String {
        format!("budgetvault.{}", c.name())
    }
}
