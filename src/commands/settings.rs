// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use crate::db::App;
use crate::utils::{coerce_number, maybe_print_json, parse_date, pretty_table};

pub async fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => show(app, sub)?,
        Some(("set", sub)) => set(app, sub).await?,
        _ => {}
    }
    Ok(())
}

fn show(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let s = app.coordinator.current();
    if maybe_print_json(sub.get_flag("json"), &s)? {
        return Ok(());
    }
    let opt = |v: Option<String>| v.unwrap_or_else(|| "(unset)".to_string());
    let rows = vec![
        vec!["Currency".into(), s.currency.clone()],
        vec!["Monthly income".into(), opt(s.monthly_income.map(|v| v.to_string()))],
        vec![
            "Savings %".into(),
            format!(
                "{}{}",
                s.effective_savings_percentage(),
                if s.savings_percentage.is_none() { " (default)" } else { "" }
            ),
        ],
        vec!["Last payday".into(), opt(s.last_payday.map(|d| d.to_string()))],
        vec!["Next payday".into(), opt(s.next_payday.map(|d| d.to_string()))],
        vec!["Streak".into(), s.streak.to_string()],
        vec!["Setup complete".into(), s.setup_complete.to_string()],
    ];
    println!("{}", pretty_table(&["Setting", "Value"], rows));
    Ok(())
}

async fn set(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let income = sub.get_one::<String>("income").map(|s| coerce_number(s));
    let pct = sub.get_one::<String>("savings-pct").map(|s| coerce_number(s));
    let next = sub
        .get_one::<String>("next-payday")
        .map(|s| parse_date(s))
        .transpose()?;
    let last = sub
        .get_one::<String>("last-payday")
        .map(|s| parse_date(s))
        .transpose()?;
    let currency = sub.get_one::<String>("currency").map(|s| s.trim().to_uppercase());
    let setup_complete = sub.get_flag("setup-complete");

    app.coordinator.update(|s| {
        if let Some(v) = income {
            s.monthly_income = v;
        }
        if let Some(v) = pct {
            s.savings_percentage = v;
        }
        if next.is_some() {
            s.next_payday = next;
        }
        if last.is_some() {
            s.last_payday = last;
        }
        if let Some(c) = currency {
            s.currency = c;
        }
        if setup_complete {
            s.setup_complete = true;
        }
    });
    let outcome = app.coordinator.save_now().await?;
    tracing::debug!(?outcome, "settings saved");
    println!("Settings saved");
    Ok(())
}
