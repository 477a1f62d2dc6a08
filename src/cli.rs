// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, command, value_parser};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

pub fn build_cli() -> Command {
    command!()
        .about("Local-first budget tracking with crash-safe persistence")
        .subcommand_required(false)
        .subcommand(Command::new("init").about("Create the data directory and stores"))
        .subcommand(
            Command::new("settings")
                .about("Show or change settings")
                .subcommand(Command::new("show").arg(json_flag()))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("income").long("income").help("Monthly income; blank unsets"))
                        .arg(
                            Arg::new("savings-pct")
                                .long("savings-pct")
                                .help("Savings percentage; 0 is a valid value, blank unsets"),
                        )
                        .arg(Arg::new("next-payday").long("next-payday"))
                        .arg(Arg::new("last-payday").long("last-payday"))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(
                            Arg::new("setup-complete")
                                .long("setup-complete")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Income and expense transactions")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["expense", "income"])
                                .default_value("expense"),
                        )
                        .arg(Arg::new("category").long("category").value_parser(value_parser!(i64)))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(Arg::new("limit").long("limit").value_parser(value_parser!(usize)))
                        .arg(json_flag()),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("fixed")
                .about("Recurring monthly expenses")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("category").long("category").value_parser(value_parser!(i64))),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("future")
                .about("Planned one-off expenses")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("due").long("due").required(true))
                        .arg(Arg::new("category").long("category").value_parser(value_parser!(i64)))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("savings")
                .about("Savings ledger")
                .subcommand(
                    Command::new("add")
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .allow_hyphen_values(true)
                                .help("Positive deposits, negative withdrawals"),
                        )
                        .arg(Arg::new("date").long("date")),
                )
                .subcommand(Command::new("list").arg(json_flag())),
        )
        .subcommand(
            Command::new("budget")
                .about("Derived budget figures")
                .subcommand(
                    Command::new("daily")
                        .arg(Arg::new("date").long("date"))
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("backup")
                .about("Flat-store backups")
                .subcommand(Command::new("create"))
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("restore"))
                .subcommand(
                    Command::new("dismiss").about("Keep the current data despite a data-loss warning"),
                ),
        )
        .subcommand(Command::new("doctor").about("Check backends, ledger and backups"))
}
