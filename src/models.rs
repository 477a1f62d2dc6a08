// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::utils::{lenient_amount, lenient_decimal};

/// Fixed id of the settings singleton.
pub const SETTINGS_ID: i64 = 1;
pub const DEFAULT_SAVINGS_PERCENTAGE: Decimal = Decimal::TEN;
pub const BACKUP_FORMAT_VERSION: u32 = 1;

/// The persisted collections. Every record type lives in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Settings,
    Transactions,
    FixedExpenses,
    FutureExpenses,
    Savings,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Settings,
        Collection::Transactions,
        Collection::FixedExpenses,
        Collection::FutureExpenses,
        Collection::Savings,
    ];

    /// Storage name, shared by the SQLite table and the flat-store key.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Settings => "settings",
            Collection::Transactions => "transactions",
            Collection::FixedExpenses => "fixedExpenses",
            Collection::FutureExpenses => "futureExpenses",
            Collection::Savings => "savings",
        }
    }
}

/// A record stored in one of the collections, keyed by `id`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
    fn id(&self) -> i64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: i64,
    pub currency: String,
    /// `None` means "not configured"; `Some(0)` is a real value.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub monthly_income: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub savings_percentage: Option<Decimal>,
    #[serde(default)]
    pub last_payday: Option<NaiveDate>,
    #[serde(default)]
    pub next_payday: Option<NaiveDate>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub setup_complete: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID,
            currency: "USD".to_string(),
            monthly_income: None,
            savings_percentage: None,
            last_payday: None,
            next_payday: None,
            streak: 0,
            achievements: Vec::new(),
            setup_complete: false,
            updated_at: None,
        }
    }
}

impl Settings {
    pub fn effective_income(&self) -> Decimal {
        self.monthly_income.unwrap_or(Decimal::ZERO)
    }

    pub fn effective_savings_percentage(&self) -> Decimal {
        self.savings_percentage
            .unwrap_or(DEFAULT_SAVINGS_PERCENTAGE)
    }

    /// Copy with the singleton id and every numeric field in range.
    pub fn normalized(&self) -> Settings {
        let mut s = self.clone();
        s.id = SETTINGS_ID;
        s.monthly_income = s.monthly_income.map(|v| v.max(Decimal::ZERO));
        s.savings_percentage = s
            .savings_percentage
            .map(|v| v.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED));
        s
    }
}

impl Record for Settings {
    const COLLECTION: Collection = Collection::Settings;
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Decimal,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

impl Record for Transaction {
    const COLLECTION: Collection = Collection::Transactions;
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedExpense {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Decimal,
    pub category_id: Option<i64>,
}

impl Record for FixedExpense {
    const COLLECTION: Collection = Collection::FixedExpenses;
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FutureExpense {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Record for FutureExpense {
    const COLLECTION: Collection = Collection::FutureExpenses;
    fn id(&self) -> i64 {
        self.id
    }
}

/// One line of the savings ledger. `amount` is signed, `total` is the running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsEntry {
    pub id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub total: Decimal,
}

impl Record for SavingsEntry {
    const COLLECTION: Collection = Collection::Savings;
    fn id(&self) -> i64 {
        self.id
    }
}

/// Every collection at one instant, kept outside the primary backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub settings: Option<Settings>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub fixed_expenses: Vec<FixedExpense>,
    #[serde(default)]
    pub future_expenses: Vec<FutureExpense>,
    #[serde(default)]
    pub savings: Vec<SavingsEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotTag {
    Routine,
    Emergency,
}

/// Settings written to the flat store as a safety net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub tag: SnapshotTag,
    pub saved_at: DateTime<Utc>,
    pub settings: Settings,
}
