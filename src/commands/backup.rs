// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::db::App;
use crate::utils::{maybe_print_json, pretty_table};

pub async fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("create", _)) => match app.backups.create().await? {
            Some(b) => println!("Backup created at {}", b.created_at),
            None => println!("Nothing to back up"),
        },
        Some(("list", sub)) => {
            let ring = app.backups.list();
            if !maybe_print_json(sub.get_flag("json"), &ring)? {
                let rows = ring
                    .iter()
                    .map(|b| {
                        vec![
                            b.created_at.to_rfc3339(),
                            b.settings.is_some().to_string(),
                            b.transactions.len().to_string(),
                            b.fixed_expenses.len().to_string(),
                            b.future_expenses.len().to_string(),
                            b.savings.len().to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Created", "Settings", "Transactions", "Fixed", "Future", "Savings"],
                        rows
                    )
                );
            }
        }
        Some(("restore", _)) => {
            let restored = app.backups.restore_latest().await?;
            // Restored settings become the in-memory copy.
            app.coordinator.load().await;
            println!("Restored backup from {}", restored.created_at);
        }
        Some(("dismiss", _)) => {
            app.backups.acknowledge_loss();
            println!("Keeping current data; backups resume");
        }
        _ => {}
    }
    Ok(())
}
