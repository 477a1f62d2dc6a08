// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use budgetvault::cli::build_cli;
use budgetvault::config::{DisplayMode, PersistenceConfig, parse_setting};
use budgetvault::models::{Collection, Settings};
use budgetvault::utils::{coerce_amount, coerce_number, month_end, parse_date};

#[test]
fn literal_zero_is_a_value_not_unset() {
    assert_eq!(coerce_number("0"), Some(Decimal::ZERO));
    assert_eq!(coerce_number(" 12.5 "), Some(Decimal::new(125, 1)));
    assert_eq!(coerce_number("1e3"), Some(Decimal::from(1000)));
    assert_eq!(coerce_number(""), None);
    assert_eq!(coerce_number("NaN"), None);
    assert_eq!(coerce_number("inf"), None);
    assert_eq!(coerce_number("abc"), None);
}

#[test]
fn amounts_are_non_negative_and_default_to_zero() {
    assert_eq!(coerce_amount("-40"), Decimal::from(40));
    assert_eq!(coerce_amount("nan"), Decimal::ZERO);
    assert_eq!(coerce_amount(""), Decimal::ZERO);
}

#[test]
fn settings_decode_leniently() {
    let s: Settings = serde_json::from_value(json!({
        "id": 1,
        "currency": "EUR",
        "monthlyIncome": "2000",
        "savingsPercentage": 0
    }))
    .unwrap();
    assert_eq!(s.monthly_income, Some(Decimal::from(2000)));
    assert_eq!(s.savings_percentage, Some(Decimal::ZERO));
    assert!(!s.setup_complete);

    let blank: Settings = serde_json::from_value(json!({
        "id": 1,
        "currency": "EUR",
        "monthlyIncome": "",
        "savingsPercentage": null
    }))
    .unwrap();
    assert_eq!(blank.monthly_income, None);
    assert_eq!(blank.savings_percentage, None);
    assert_eq!(blank.effective_savings_percentage(), Decimal::TEN);
}

#[test]
fn settings_encode_camel_case() {
    let s = Settings {
        savings_percentage: Some(Decimal::ZERO),
        ..Settings::default()
    };
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["savingsPercentage"], json!("0"));
    assert_eq!(v["setupComplete"], json!(false));
}

#[test]
fn collection_names_match_storage_keys() {
    let names: Vec<&str> = Collection::ALL.iter().map(|c| c.name()).collect();
    assert_eq!(
        names,
        vec!["settings", "transactions", "fixedExpenses", "futureExpenses", "savings"]
    );
}

#[test]
fn month_end_handles_leap_years_and_december() {
    let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    assert_eq!(month_end(d(2024, 2, 10)), d(2024, 2, 29));
    assert_eq!(month_end(d(2025, 12, 3)), d(2025, 12, 31));
    assert!(parse_date("2025-13-01").is_err());
}

#[test]
fn debounce_depends_on_display_mode() {
    let mut cfg = PersistenceConfig::default();
    assert_eq!(cfg.debounce_delay().as_millis(), 1000);
    cfg.display_mode = DisplayMode::Standalone;
    assert_eq!(cfg.debounce_delay().as_millis(), 500);
    assert_eq!(cfg.save_retries, 5);
}

#[test]
fn numeric_overrides_ignore_garbage() {
    assert_eq!(parse_setting::<u64>("BUDGETVAULT_OPEN_TIMEOUT_MS", " 750 "), Some(750));
    assert_eq!(parse_setting::<u64>("BUDGETVAULT_OPEN_TIMEOUT_MS", "soon"), None);
    assert_eq!(parse_setting::<usize>("BUDGETVAULT_BACKUP_RETENTION", "-3"), None);
}

#[test]
fn cli_definition_is_consistent() {
    build_cli().debug_assert();
}
