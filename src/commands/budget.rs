// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use chrono::Utc;

use crate::budget::{breakdown, total_future_accrual};
use crate::db::App;
use crate::models::{FixedExpense, FutureExpense};
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};

pub async fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("daily", sub)) = m.subcommand() {
        daily(app, sub).await?;
    }
    Ok(())
}

async fn daily(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let today = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Utc::now().date_naive(),
    };
    let settings = app.coordinator.current();
    let fixed = app.gateway.read::<FixedExpense>().await;
    let future = app.gateway.read::<FutureExpense>().await;
    let b = breakdown(&settings, &fixed, today);
    if maybe_print_json(sub.get_flag("json"), &b)? {
        return Ok(());
    }
    let ccy = settings.currency.as_str();
    let rows = vec![
        vec!["Income".into(), fmt_money(&b.income, ccy)],
        vec!["Fixed expenses".into(), fmt_money(&b.fixed, ccy)],
        vec!["Savings".into(), fmt_money(&b.savings, ccy)],
        vec!["Available".into(), fmt_money(&b.available, ccy)],
        vec!["Days until payday".into(), b.days_until_payday.to_string()],
        vec!["Daily budget".into(), fmt_money(&b.daily, ccy)],
        vec![
            "Set aside for planned".into(),
            fmt_money(&total_future_accrual(&future, today), ccy),
        ],
    ];
    println!("{}", pretty_table(&["Item", "Value"], rows));
    Ok(())
}
