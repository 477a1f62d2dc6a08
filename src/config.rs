// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Budgetvault", "budgetvault"));

const DEFAULT_KV_QUOTA_BYTES: usize = 5 * 1024 * 1024;
const MIN_KV_QUOTA_BYTES: usize = 64 * 1024;
const HARD_MAX_BACKUP_RETENTION: usize = 10;

/// How the app is hosted. Installed apps get shorter debounce and the
/// extra flat-store snapshot plus read-back verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Standalone,
    Browser,
}

impl DisplayMode {
    pub fn is_standalone(self) -> bool {
        matches!(self, DisplayMode::Standalone)
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub display_mode: DisplayMode,
    pub data_dir: Option<PathBuf>,
    /// Bounded wait for the structured backend to open.
    pub open_timeout: Duration,
    pub debounce_standalone: Duration,
    pub debounce_browser: Duration,
    /// Pause before reading settings back after a standalone save.
    pub verify_delay: Duration,
    /// Retries after the first failed write.
    pub save_retries: u32,
    /// Linear backoff step: retry `n` waits `n * step`.
    pub retry_step: Duration,
    /// Minimum gap between two foreground verification saves.
    pub verification_throttle: Duration,
    pub backup_delay: Duration,
    pub backup_interval: Duration,
    pub backup_retention: usize,
    pub kv_quota_bytes: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            display_mode: DisplayMode::Browser,
            data_dir: None,
            open_timeout: Duration::from_secs(5),
            debounce_standalone: Duration::from_millis(500),
            debounce_browser: Duration::from_millis(1000),
            verify_delay: Duration::from_millis(100),
            save_retries: 5,
            retry_step: Duration::from_secs(1),
            verification_throttle: Duration::from_secs(1),
            backup_delay: Duration::from_secs(1),
            backup_interval: Duration::from_secs(10 * 60),
            backup_retention: 3,
            kv_quota_bytes: DEFAULT_KV_QUOTA_BYTES,
        }
    }
}

impl PersistenceConfig {
    /// Defaults overridden by `BUDGETVAULT_*` environment variables.
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Some(mode) = env_var("BUDGETVAULT_DISPLAY_MODE") {
            match mode.to_ascii_lowercase().as_str() {
                "standalone" => cfg.display_mode = DisplayMode::Standalone,
                "browser" => cfg.display_mode = DisplayMode::Browser,
                other => tracing::warn!(value = other, "ignoring unknown BUDGETVAULT_DISPLAY_MODE"),
            }
        }
        if let Some(dir) = env_var("BUDGETVAULT_DATA_DIR") {
            cfg.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(ms) = env_parse::<u64>("BUDGETVAULT_OPEN_TIMEOUT_MS").filter(|v| *v > 0) {
            cfg.open_timeout = Duration::from_millis(ms.min(60_000));
        }
        if let Some(secs) = env_parse::<u64>("BUDGETVAULT_BACKUP_INTERVAL_SECS").filter(|v| *v > 0) {
            cfg.backup_interval = Duration::from_secs(secs.clamp(60, 24 * 60 * 60));
        }
        if let Some(n) = env_parse::<usize>("BUDGETVAULT_BACKUP_RETENTION").filter(|v| *v > 0) {
            cfg.backup_retention = n.min(HARD_MAX_BACKUP_RETENTION);
        }
        if let Some(bytes) = env_parse::<usize>("BUDGETVAULT_KV_QUOTA_BYTES") {
            cfg.kv_quota_bytes = bytes.max(MIN_KV_QUOTA_BYTES);
        }
        cfg
    }

    pub fn debounce_delay(&self) -> Duration {
        match self.display_mode {
            DisplayMode::Standalone => self.debounce_standalone,
            DisplayMode::Browser => self.debounce_browser,
        }
    }

    /// Configured data dir, else the platform data dir. Created if missing.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(d) => d.clone(),
            None => ProjectDirs::from(APP.0, APP.1, APP.2)
                .context("Could not determine platform-specific data dir")?
                .data_dir()
                .to_path_buf(),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data dir {}", dir.display()))?;
        Ok(dir)
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| parse_setting(key, &v))
}

/// Parses one numeric override; a bad value is logged and ignored.
pub fn parse_setting<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw, "ignoring unparseable setting");
            None
        }
    }
}
