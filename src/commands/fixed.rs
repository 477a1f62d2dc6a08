// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rust_decimal::Decimal;

use super::{next_id, required};
use crate::db::App;
use crate::gateway::WriteMode;
use crate::models::FixedExpense;
use crate::utils::{coerce_amount, maybe_print_json, pretty_table};

pub async fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub).await?,
        Some(("list", sub)) => list(app, sub).await?,
        Some(("rm", sub)) => {
            let id = *sub
                .get_one::<i64>("id")
                .ok_or_else(|| anyhow::anyhow!("--id is required"))?;
            if !app.gateway.delete::<FixedExpense>(id).await {
                bail!("Fixed expense {} could not be deleted", id);
            }
            println!("Deleted fixed expense {}", id);
        }
        _ => {}
    }
    Ok(())
}

async fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let existing = app.gateway.read::<FixedExpense>().await;
    let item = FixedExpense {
        id: next_id(&existing),
        name: required(sub, "name")?.trim().to_string(),
        amount: coerce_amount(required(sub, "amount")?),
        category_id: sub.get_one::<i64>("category").copied(),
    };
    if !app.gateway.write(&item, WriteMode::Add).await {
        bail!("Fixed expense could not be saved");
    }
    println!("Added fixed expense '{}' ({:.2}/month)", item.name, item.amount);
    Ok(())
}

async fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let data = app.gateway.read::<FixedExpense>().await;
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let total: Decimal = data.iter().map(|f| f.amount).sum();
        let mut rows: Vec<Vec<String>> = data
            .iter()
            .map(|f| vec![f.id.to_string(), f.name.clone(), format!("{:.2}", f.amount)])
            .collect();
        rows.push(vec![String::new(), "Total".into(), format!("{:.2}", total)]);
        println!("{}", pretty_table(&["ID", "Name", "Amount"], rows));
    }
    Ok(())
}
