// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use chrono::Utc;

use super::required;
use crate::db::App;
use crate::gateway::WriteMode;
use crate::models::SavingsEntry;
use crate::savings::{add_to_savings, total};
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};

pub async fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub).await?,
        Some(("list", sub)) => list(app, sub).await?,
        _ => {}
    }
    Ok(())
}

async fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(required(sub, "amount")?)?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Utc::now().date_naive(),
    };
    let mut history = app.gateway.read::<SavingsEntry>().await;
    let entry = add_to_savings(&mut history, amount, date);
    if !app.gateway.write(&entry, WriteMode::Add).await {
        bail!("Savings entry could not be saved");
    }
    println!("Savings balance: {:.2}", entry.total);
    Ok(())
}

async fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let history = app.gateway.read::<SavingsEntry>().await;
    if !maybe_print_json(sub.get_flag("json"), &history)? {
        let rows: Vec<Vec<String>> = history
            .iter()
            .map(|e| {
                vec![
                    e.date.to_string(),
                    if e.amount.is_sign_negative() {
                        format!("{:.2}", e.amount)
                    } else {
                        format!("+{:.2}", e.amount)
                    },
                    format!("{:.2}", e.total),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Date", "Amount", "Balance"], rows));
        println!("Total savings: {:.2}", total(&history));
    }
    Ok(())
}
