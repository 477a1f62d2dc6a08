// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{FixedExpense, FutureExpense, Settings};
use crate::utils::month_end;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetBreakdown {
    pub income: Decimal,
    pub fixed: Decimal,
    pub savings: Decimal,
    /// `income - fixed - savings`
    pub available: Decimal,
    pub days_until_payday: i64,
    pub daily: Decimal,
}

/// Days left in the pay period, counting today. Without a future payday the
/// period ends with the current month.
pub fn days_until_payday(settings: &Settings, today: NaiveDate) -> i64 {
    let days = match settings.next_payday {
        Some(payday) if payday > today => (payday - today).num_days(),
        _ => (month_end(today) - today).num_days() + 1,
    };
    days.max(1)
}

pub fn breakdown(settings: &Settings, fixed: &[FixedExpense], today: NaiveDate) -> BudgetBreakdown {
    let income = settings.effective_income();
    let fixed_total: Decimal = fixed.iter().map(|f| f.amount).sum();
    let savings = income * settings.effective_savings_percentage() / Decimal::ONE_HUNDRED;
    let available = income - fixed_total - savings;
    let days = days_until_payday(settings, today);
    BudgetBreakdown {
        income,
        fixed: fixed_total,
        savings,
        available,
        days_until_payday: days,
        daily: available / Decimal::from(days),
    }
}

pub fn calculate_daily_budget(settings: &Settings, fixed: &[FixedExpense], today: NaiveDate) -> Decimal {
    breakdown(settings, fixed, today).daily
}

/// What has to be set aside per day to cover a planned expense by its due date.
pub fn future_daily_accrual(expense: &FutureExpense, today: NaiveDate) -> Decimal {
    let days = (expense.due_date - today).num_days().max(1);
    expense.amount / Decimal::from(days)
}

pub fn total_future_accrual(expenses: &[FutureExpense], today: NaiveDate) -> Decimal {
    expenses
        .iter()
        .map(|e| future_daily_accrual(e, today))
        .sum()
}
