// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use chrono::Utc;

use super::{next_id, required};
use crate::budget::future_daily_accrual;
use crate::db::App;
use crate::gateway::WriteMode;
use crate::models::FutureExpense;
use crate::utils::{coerce_amount, maybe_print_json, parse_date, pretty_table};

pub async fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub).await?,
        Some(("list", sub)) => list(app, sub).await?,
        Some(("rm", sub)) => {
            let id = *sub
                .get_one::<i64>("id")
                .ok_or_else(|| anyhow::anyhow!("--id is required"))?;
            if !app.gateway.delete::<FutureExpense>(id).await {
                bail!("Future expense {} could not be deleted", id);
            }
            println!("Deleted future expense {}", id);
        }
        _ => {}
    }
    Ok(())
}

async fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let existing = app.gateway.read::<FutureExpense>().await;
    let item = FutureExpense {
        id: next_id(&existing),
        name: required(sub, "name")?.trim().to_string(),
        amount: coerce_amount(required(sub, "amount")?),
        due_date: parse_date(required(sub, "due")?)?,
        category_id: sub.get_one::<i64>("category").copied(),
        description: sub
            .get_one::<String>("description")
            .cloned()
            .unwrap_or_default(),
        created_at: Utc::now(),
    };
    if !app.gateway.write(&item, WriteMode::Add).await {
        bail!("Future expense could not be saved");
    }
    println!("Planned '{}' ({:.2}) due {}", item.name, item.amount, item.due_date);
    Ok(())
}

async fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let mut data = app.gateway.read::<FutureExpense>().await;
    data.sort_by_key(|e| e.due_date);
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let today = Utc::now().date_naive();
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.name.clone(),
                    e.due_date.to_string(),
                    format!("{:.2}", e.amount),
                    format!("{:.2}", future_daily_accrual(e, today)),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Name", "Due", "Amount", "Per day"], rows)
        );
    }
    Ok(())
}
