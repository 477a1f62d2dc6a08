// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod backup;
pub mod budget;
pub mod cli;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod retry;
pub mod savings;
pub mod store;
pub mod utils;
