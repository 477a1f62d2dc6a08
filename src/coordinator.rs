// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Owns the settings write path: debounced and immediate saves, the flat-store
//! safety snapshots, read-back verification and the bounded retry loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::config::PersistenceConfig;
use crate::error::PersistenceError;
use crate::gateway::{PersistenceGateway, WriteMode};
use crate::models::{Settings, SettingsSnapshot, SnapshotTag};
use crate::retry::{RetryPolicy, retry_with_backoff};
use crate::store::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved {
        /// Read-back ran and matched (or was reconciled).
        verified: bool,
        /// The read-back disagreed and the single reconciliation write went out.
        reconciled: bool,
        attempts: u32,
    },
    /// Another save was running; it will pick up the latest settings.
    Coalesced,
    /// Throttled verification save that did not run.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    Primary,
    RoutineSnapshot,
    EmergencySnapshot,
    Defaults,
}

#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub source: SettingsSource,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SettingsSaveCoordinator {
    gateway: Arc<PersistenceGateway>,
    config: PersistenceConfig,
    staged: Mutex<Settings>,
    in_flight: AtomicBool,
    rerun: AtomicBool,
    generation: AtomicU64,
    last_save: Mutex<Option<Instant>>,
    last_saved_at: Mutex<Option<DateTime<Utc>>>,
}

impl SettingsSaveCoordinator {
    pub fn new(gateway: Arc<PersistenceGateway>, config: PersistenceConfig) -> Self {
        Self {
            gateway,
            config,
            staged: Mutex::new(Settings::default()),
            in_flight: AtomicBool::new(false),
            rerun: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            last_save: Mutex::new(None),
            last_saved_at: Mutex::new(None),
        }
    }

    pub fn gateway(&self) -> &Arc<PersistenceGateway> {
        &self.gateway
    }

    pub fn current(&self) -> Settings {
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        *self
            .last_saved_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the in-memory settings and schedules a debounced save.
    pub fn stage(self: &Arc<Self>, settings: Settings) {
        *self.staged.lock().unwrap_or_else(PoisonError::into_inner) = settings;
        self.schedule_save();
    }

    pub fn update(self: &Arc<Self>, f: impl FnOnce(&mut Settings)) {
        {
            let mut staged = self.staged.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut staged);
        }
        self.schedule_save();
    }

    /// Trailing debounce. Each call supersedes the previous timer; only the
    /// newest generation writes once the quiet period elapses.
    pub fn schedule_save(self: &Arc<Self>) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let delay = self.config.debounce_delay();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if this.generation.load(Ordering::Acquire) != generation {
                return;
            }
            if let Err(e) = this.save_now().await {
                tracing::warn!(error = %e, "debounced settings save failed");
            }
        });
    }

    /// Writes the staged settings now, bypassing any pending debounce.
    pub async fn save_now(&self) -> Result<SaveOutcome, PersistenceError> {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if self.in_flight.swap(true, Ordering::AcqRel) {
            self.rerun.store(true, Ordering::Release);
            tracing::debug!("settings save already in flight; coalescing");
            return Ok(SaveOutcome::Coalesced);
        }
        let _guard = InFlight(&self.in_flight);
        loop {
            let result = self.persist(self.snapshot()).await;
            // No await between the rerun check and the guard release.
            let rerun = self.rerun.swap(false, Ordering::AcqRel);
            match result {
                Ok(_) if rerun => {}
                Err(PersistenceError::TerminalPersistenceFailure { .. }) if rerun => {
                    // A coalesced caller staged newer settings than the ones that failed.
                    let latest = self.snapshot();
                    if !self.write_flat_snapshot(keys::EMERGENCY_SETTINGS, SnapshotTag::Emergency, &latest) {
                        tracing::error!("emergency settings snapshot could not be refreshed");
                    }
                    self.mark_saved(false);
                    return result;
                }
                Err(_) if rerun => {}
                _ => {
                    self.mark_saved(result.is_ok());
                    return result;
                }
            }
            tracing::debug!("settings changed during save; writing again");
        }
    }

    fn mark_saved(&self, succeeded: bool) {
        *self.last_save.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        if succeeded {
            *self
                .last_saved_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
        }
    }

    /// Foreground check-in: skipped while a save runs or if one finished
    /// within the throttle window.
    pub async fn verification_save(&self) -> Result<SaveOutcome, PersistenceError> {
        if self.is_saving() {
            return Ok(SaveOutcome::Skipped);
        }
        let recent = self
            .last_save
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|t| t.elapsed() < self.config.verification_throttle);
        if recent {
            return Ok(SaveOutcome::Skipped);
        }
        self.save_now().await
    }

    fn snapshot(&self) -> Settings {
        let mut s = self.current().normalized();
        s.updated_at = Some(Utc::now());
        s
    }

    async fn persist(&self, settings: Settings) -> Result<SaveOutcome, PersistenceError> {
        let standalone = self.config.display_mode.is_standalone();
        if standalone {
            self.write_flat_snapshot(keys::CURRENT_SETTINGS, SnapshotTag::Routine, &settings);
        }

        let policy = RetryPolicy::linear(self.config.save_retries + 1, self.config.retry_step);
        let snapshot = &settings;
        let written = retry_with_backoff(&policy, move |attempt| async move {
            if attempt > 1 {
                self.gateway.reinitialize().await;
            }
            self.gateway
                .try_write(snapshot, WriteMode::Upsert)
                .await
                .map(|()| attempt)
                .map_err(|e| PersistenceError::BackendUnavailable(e.to_string()))
        })
        .await;

        let attempts = match written {
            Ok(attempts) => attempts,
            Err(exhausted) => {
                tracing::error!(
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "settings save exhausted retries; writing emergency snapshot"
                );
                if !self.write_flat_snapshot(keys::EMERGENCY_SETTINGS, SnapshotTag::Emergency, &settings) {
                    tracing::error!("emergency settings snapshot could not be written");
                }
                return Err(PersistenceError::TerminalPersistenceFailure {
                    attempts: exhausted.attempts,
                });
            }
        };

        if !standalone {
            return Ok(SaveOutcome::Saved {
                verified: false,
                reconciled: false,
                attempts,
            });
        }
        self.verify(&settings, attempts).await
    }

    /// Reads the settings back and compares the savings percentage, the
    /// field most likely to be lost. One reconciliation write on mismatch.
    async fn verify(&self, intended: &Settings, attempts: u32) -> Result<SaveOutcome, PersistenceError> {
        tokio::time::sleep(self.config.verify_delay).await;
        let found = match self.gateway.try_read_settings().await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "settings read-back failed; skipping verification");
                return Ok(SaveOutcome::Saved {
                    verified: false,
                    reconciled: false,
                    attempts,
                });
            }
        };
        let found_pct = found.as_ref().and_then(|s| s.savings_percentage);
        if found.is_some() && found_pct == intended.savings_percentage {
            return Ok(SaveOutcome::Saved {
                verified: true,
                reconciled: false,
                attempts,
            });
        }

        let mismatch = PersistenceError::VerificationMismatch {
            expected: intended.savings_percentage,
            found: found_pct,
        };
        tracing::warn!(error = %mismatch, "reconciling settings");
        if self.gateway.write(intended, WriteMode::Upsert).await {
            Ok(SaveOutcome::Saved {
                verified: true,
                reconciled: true,
                attempts,
            })
        } else {
            Err(mismatch)
        }
    }

    fn write_flat_snapshot(&self, key: &str, tag: SnapshotTag, settings: &Settings) -> bool {
        let snapshot = SettingsSnapshot {
            tag,
            saved_at: Utc::now(),
            settings: settings.clone(),
        };
        self.gateway.flat_store().set(key, &snapshot)
    }

    /// Startup recovery: the newest of the primary copy and the two flat-store
    /// snapshots wins. A snapshot that beats the primary is written back.
    pub async fn load(&self) -> LoadedSettings {
        let kv = self.gateway.flat_store();
        let mut best: Option<(Settings, SettingsSource)> = self
            .gateway
            .read_settings()
            .await
            .map(|s| (s, SettingsSource::Primary));

        let snapshots = [
            (keys::CURRENT_SETTINGS, SettingsSource::RoutineSnapshot),
            (keys::EMERGENCY_SETTINGS, SettingsSource::EmergencySnapshot),
        ];
        for (key, source) in snapshots {
            let Some(snap) = kv.get::<SettingsSnapshot>(key) else {
                continue;
            };
            let snap_time = snap.settings.updated_at.unwrap_or(snap.saved_at);
            let newer = match &best {
                None => true,
                Some((current, _)) => current.updated_at.is_none_or(|t| snap_time > t),
            };
            if newer {
                best = Some((snap.settings, source));
            }
        }

        let (settings, source) = best.unwrap_or_else(|| (Settings::default(), SettingsSource::Defaults));
        *self.staged.lock().unwrap_or_else(PoisonError::into_inner) = settings.clone();

        if matches!(source, SettingsSource::RoutineSnapshot | SettingsSource::EmergencySnapshot) {
            tracing::info!(source = ?source, "recovering settings from flat-store snapshot");
            match self.save_now().await {
                Ok(_) => {
                    kv.remove(keys::EMERGENCY_SETTINGS);
                }
                Err(e) => tracing::warn!(error = %e, "recovered settings could not be written back"),
            }
        }

        LoadedSettings { settings, source }
    }
}
