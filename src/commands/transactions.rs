// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};

use super::{next_id, required};
use crate::db::App;
use crate::gateway::WriteMode;
use crate::models::{Transaction, TransactionKind};
use crate::utils::{coerce_amount, fmt_money, maybe_print_json, parse_date, pretty_table};

pub async fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub).await?,
        Some(("list", sub)) => list(app, sub).await?,
        Some(("rm", sub)) => remove(app, sub).await?,
        _ => {}
    }
    Ok(())
}

async fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let amount = coerce_amount(required(sub, "amount")?);
    let date = parse_date(required(sub, "date")?)?;
    let kind = match sub.get_one::<String>("type").map(String::as_str) {
        Some("income") => TransactionKind::Income,
        _ => TransactionKind::Expense,
    };
    let existing = app.gateway.read::<Transaction>().await;
    let tx = Transaction {
        id: next_id(&existing),
        amount,
        category_id: sub.get_one::<i64>("category").copied(),
        description: sub
            .get_one::<String>("description")
            .cloned()
            .unwrap_or_default(),
        date,
        kind,
    };
    if !app.gateway.write(&tx, WriteMode::Add).await {
        bail!("Transaction could not be saved");
    }
    println!(
        "Recorded {:?} of {} on {}",
        kind,
        fmt_money(&amount, &app.coordinator.current().currency),
        date
    );
    Ok(())
}

pub async fn query_rows(app: &App, limit: Option<usize>) -> Vec<Transaction> {
    let mut rows = app.gateway.read::<Transaction>().await;
    rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

async fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(app, sub.get_one::<usize>("limit").copied()).await;
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    format!("{:?}", t.kind).to_lowercase(),
                    format!("{:.2}", t.amount),
                    t.category_id.map(|c| c.to_string()).unwrap_or_default(),
                    t.description.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Type", "Amount", "Category", "Description"], rows)
        );
    }
    Ok(())
}

async fn remove(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub
        .get_one::<i64>("id")
        .ok_or_else(|| anyhow::anyhow!("--id is required"))?;
    if !app.gateway.delete::<Transaction>(id).await {
        bail!("Transaction {} could not be deleted", id);
    }
    println!("Deleted transaction {}", id);
    Ok(())
}
