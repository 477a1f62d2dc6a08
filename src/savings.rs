// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Append-only savings ledger. Each entry carries the running balance:
//! `total[0] == amount[0]` and `total[i] == total[i-1] + amount[i]`.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::SavingsEntry;

pub fn total(history: &[SavingsEntry]) -> Decimal {
    history.last().map(|e| e.total).unwrap_or(Decimal::ZERO)
}

/// Appends a deposit (positive) or withdrawal (negative) and returns the new entry.
pub fn add_to_savings(history: &mut Vec<SavingsEntry>, amount: Decimal, date: NaiveDate) -> SavingsEntry {
    let id = history.iter().map(|e| e.id).max().unwrap_or(0) + 1;
    let entry = SavingsEntry {
        id,
        amount,
        date,
        total: total(history) + amount,
    };
    history.push(entry.clone());
    entry
}

/// Index of the first entry whose total breaks the running balance.
pub fn verify_ledger(history: &[SavingsEntry]) -> Option<usize> {
    let mut running = Decimal::ZERO;
    for (i, e) in history.iter().enumerate() {
        running += e.amount;
        if e.total != running {
            return Some(i);
        }
    }
    None
}

/// Recomputes every total from the amounts. Returns how many entries changed.
pub fn rebuild_totals(history: &mut [SavingsEntry]) -> usize {
    let mut running = Decimal::ZERO;
    let mut changed = 0;
    for e in history.iter_mut() {
        running += e.amount;
        if e.total != running {
            e.total = running;
            changed += 1;
        }
    }
    changed
}
