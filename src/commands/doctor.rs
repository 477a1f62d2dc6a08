// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::db::App;
use crate::gateway::ActiveBackend;
use crate::models::SavingsEntry;
use crate::savings::verify_ledger;
use crate::store::keys;
use crate::utils::pretty_table;

pub async fn handle(app: &App) -> Result<()> {
    let mut rows: Vec<Vec<String>> = Vec::new();

    // 1) Backend negotiation
    let backend = app.gateway.ensure_ready().await;
    if backend == ActiveBackend::Fallback {
        rows.push(vec![
            "structured_backend_unavailable".into(),
            "running on the flat store".into(),
        ]);
    }

    // 2) Savings ledger running totals
    let history = app.gateway.read::<SavingsEntry>().await;
    if let Some(i) = verify_ledger(&history) {
        rows.push(vec![
            "savings_ledger_broken".into(),
            format!("entry {} (id {})", i, history[i].id),
        ]);
    }

    // 3) Leftover emergency snapshot from a failed save
    if app.gateway.flat_store().contains(keys::EMERGENCY_SETTINGS) {
        rows.push(vec![
            "emergency_settings_pending".into(),
            "a save exhausted its retries; settings will be recovered on next load".into(),
        ]);
    }

    // 4) Data loss against the newest backup
    if let Some(w) = app.backups.assess().await {
        rows.push(vec![
            "possible_data_loss".into(),
            format!(
                "backup {}: settings missing={}, transactions {} (live {}); run `backup restore`",
                w.backup_created_at.to_rfc3339(),
                w.settings_missing,
                w.backup_transactions,
                w.live_transactions
            ),
        ]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found ({} backend)", backend);
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
