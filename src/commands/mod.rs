// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use crate::models::Record;

pub mod backup;
pub mod budget;
pub mod doctor;
pub mod fixed;
pub mod future;
pub mod savings;
pub mod settings;
pub mod transactions;

pub(crate) fn required<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a String> {
    m.get_one::<String>(name)
        .with_context(|| format!("--{} is required", name))
}

pub(crate) fn next_id<R: Record>(records: &[R]) -> i64 {
    records.iter().map(Record::id).max().unwrap_or(0) + 1
}
