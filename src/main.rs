// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tokio::sync::mpsc;

use budgetvault::config::PersistenceConfig;
use budgetvault::coordinator::SettingsSource;
use budgetvault::lifecycle::LifecycleSignal;
use budgetvault::{cli, commands, db, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let config = PersistenceConfig::load();
    let app = db::open_or_init(config)?;
    let loaded = app.coordinator.load().await;
    if matches!(loaded.source, SettingsSource::EmergencySnapshot) {
        eprintln!("Recovered settings from an emergency snapshot");
    }
    if let Some(w) = app.backups.assess().await {
        eprintln!(
            "Warning: data may have been lost since the backup of {} ({} transactions there, {} now). \
             Run `budgetvault backup restore`, or `budgetvault backup dismiss` to keep the current data.",
            w.backup_created_at.to_rfc3339(),
            w.backup_transactions,
            w.live_transactions
        );
    }

    // The process is the host: replies are only logged.
    let (replies, mut reply_rx) = mpsc::unbounded_channel();
    let bridge = app.bridge(replies);

    match matches.subcommand() {
        Some(("init", _)) => {
            let backend = app.gateway.ensure_ready().await;
            println!(
                "Data directory ready at {} ({} backend)",
                app.config.resolve_data_dir()?.display(),
                backend
            );
        }
        Some(("settings", sub)) => commands::settings::handle(&app, sub).await?,
        Some(("tx", sub)) => commands::transactions::handle(&app, sub).await?,
        Some(("fixed", sub)) => commands::fixed::handle(&app, sub).await?,
        Some(("future", sub)) => commands::future::handle(&app, sub).await?,
        Some(("savings", sub)) => commands::savings::handle(&app, sub).await?,
        Some(("budget", sub)) => commands::budget::handle(&app, sub).await?,
        Some(("backup", sub)) => commands::backup::handle(&app, sub).await?,
        Some(("doctor", _)) => commands::doctor::handle(&app).await?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }

    bridge.handle(LifecycleSignal::PageHide).await;
    while let Ok(reply) = reply_rx.try_recv() {
        tracing::debug!(?reply, "host reply");
    }
    Ok(())
}
