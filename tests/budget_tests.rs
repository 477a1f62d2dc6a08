// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use budgetvault::budget::{
    breakdown, calculate_daily_budget, days_until_payday, future_daily_accrual, total_future_accrual,
};
use budgetvault::models::{FixedExpense, FutureExpense, Settings};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rent() -> FixedExpense {
    FixedExpense {
        id: 1,
        name: "Rent".into(),
        amount: Decimal::from(500),
        category_id: None,
    }
}

fn planned(amount: i64, due: NaiveDate) -> FutureExpense {
    FutureExpense {
        id: 1,
        name: "Trip".into(),
        amount: Decimal::from(amount),
        due_date: due,
        category_id: None,
        description: String::new(),
        created_at: Utc::now(),
    }
}

fn settings(income: i64, pct: Option<i64>) -> Settings {
    Settings {
        monthly_income: Some(Decimal::from(income)),
        savings_percentage: pct.map(Decimal::from),
        ..Settings::default()
    }
}

#[test]
fn zero_savings_leaves_income_minus_fixed() {
    let mut s = settings(2000, Some(0));
    s.next_payday = Some(date(2025, 3, 20));
    let b = breakdown(&s, &[rent()], date(2025, 3, 10));
    assert_eq!(b.savings, Decimal::ZERO);
    assert_eq!(b.available, Decimal::from(1500));
    assert_eq!(b.days_until_payday, 10);
    assert_eq!(b.daily, Decimal::from(150));
}

#[test]
fn unset_savings_percentage_uses_the_default() {
    let b = breakdown(&settings(2000, None), &[rent()], date(2025, 3, 10));
    assert_eq!(b.savings, Decimal::from(200));
    assert_eq!(b.available, Decimal::from(1300));
}

#[test]
fn without_a_payday_the_period_ends_with_the_month() {
    let s = settings(2000, Some(0));
    assert_eq!(days_until_payday(&s, date(2025, 2, 10)), 19);
    assert_eq!(days_until_payday(&s, date(2024, 2, 29)), 1);
    assert_eq!(
        calculate_daily_budget(&s, &[rent()], date(2025, 2, 10)),
        Decimal::from(1500) / Decimal::from(19)
    );
}

#[test]
fn past_payday_is_ignored() {
    let mut s = settings(2000, Some(0));
    s.next_payday = Some(date(2025, 3, 1));
    assert_eq!(days_until_payday(&s, date(2025, 3, 10)), 22);
}

#[test]
fn unconfigured_income_budgets_nothing() {
    let b = breakdown(&Settings::default(), &[], date(2025, 3, 10));
    assert_eq!(b.income, Decimal::ZERO);
    assert_eq!(b.daily, Decimal::ZERO);
}

#[test]
fn planned_expenses_accrue_per_day() {
    let today = date(2025, 3, 1);
    assert_eq!(
        future_daily_accrual(&planned(300, date(2025, 3, 31)), today),
        Decimal::from(10)
    );
    assert_eq!(
        future_daily_accrual(&planned(300, date(2025, 2, 1)), today),
        Decimal::from(300)
    );
    let all = [planned(300, date(2025, 3, 31)), planned(50, date(2025, 3, 2))];
    assert_eq!(total_future_accrual(&all, today), Decimal::from(60));
}
