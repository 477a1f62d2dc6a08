// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use budgetvault::config::PersistenceConfig;
use budgetvault::gateway::{PersistenceGateway, WriteMode};
use budgetvault::models::SavingsEntry;
use budgetvault::savings::{add_to_savings, rebuild_totals, total, verify_ledger};
use budgetvault::store::{BackendConnector, KeyValueStore, MemoryConnector};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

#[test]
fn deposit_then_withdrawal_keeps_running_totals() {
    let mut history = Vec::new();
    add_to_savings(&mut history, Decimal::from(100), day(1));
    add_to_savings(&mut history, Decimal::from(-30), day(2));

    let totals: Vec<Decimal> = history.iter().map(|e| e.total).collect();
    assert_eq!(totals, vec![Decimal::from(100), Decimal::from(70)]);
    assert_eq!(history.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(total(&history), Decimal::from(70));
    assert_eq!(verify_ledger(&history), None);
}

#[test]
fn empty_ledger_totals_zero() {
    assert_eq!(total(&[]), Decimal::ZERO);
    assert_eq!(verify_ledger(&[]), None);
}

#[test]
fn broken_total_is_found_and_rebuilt() {
    let mut history = Vec::new();
    for (i, amount) in [50, 25, -10].into_iter().enumerate() {
        add_to_savings(&mut history, Decimal::from(amount), day(i as u32 + 1));
    }
    history[1].total = Decimal::from(999);
    assert_eq!(verify_ledger(&history), Some(1));
    assert_eq!(rebuild_totals(&mut history), 1);
    assert_eq!(verify_ledger(&history), None);
    assert_eq!(total(&history), Decimal::from(65));
}

#[tokio::test]
async fn ledger_persists_through_the_gateway() {
    let connector: Arc<dyn BackendConnector> = Arc::new(MemoryConnector::new());
    let gw = PersistenceGateway::new(
        Some(connector),
        KeyValueStore::in_memory(1 << 20),
        &PersistenceConfig::default(),
    );
    for amount in [100, -30] {
        let mut history = gw.read::<SavingsEntry>().await;
        let entry = add_to_savings(&mut history, Decimal::from(amount), day(5));
        assert!(gw.write(&entry, WriteMode::Add).await);
    }
    let stored = gw.read::<SavingsEntry>().await;
    assert_eq!(total(&stored), Decimal::from(70));
    assert_eq!(verify_ledger(&stored), None);
}

proptest! {
    #[test]
    fn every_total_is_the_prefix_sum(amounts in proptest::collection::vec(-100_000i64..100_000, 0..40)) {
        let mut history = Vec::new();
        for (i, cents) in amounts.iter().enumerate() {
            let entry = add_to_savings(&mut history, Decimal::new(*cents, 2), day((i % 28) as u32 + 1));
            prop_assert_eq!(entry.id, i as i64 + 1);
        }
        let mut running = Decimal::ZERO;
        for (entry, cents) in history.iter().zip(&amounts) {
            running += Decimal::new(*cents, 2);
            prop_assert_eq!(entry.total, running);
        }
        prop_assert_eq!(total(&history), running);
        prop_assert_eq!(verify_ledger(&history), None);
    }
}
