// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `replyd serve`: periodic sync and dispatch until a shutdown signal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use replyd_config::model::ReplydConfig;
use replyd_core::{PluginAdapter, ReplydError};
use replyd_pipeline::{run_periodic, Schedule};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::App;
use crate::shutdown;

/// Interval between heap usage log lines.
const MEMORY_LOG_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run_serve(config: ReplydConfig, config_path: Option<PathBuf>) -> Result<(), ReplydError> {
    info!(service = %config.service.name, "replyd serve starting");

    let app = App::open(&config).await?;
    let synchronizer = Arc::new(app.synchronizer(&config)?);
    let dispatcher = Arc::new(app.dispatcher(&config));

    let cancel = shutdown::install_signal_handler();
    let shared = Arc::new(ArcSwap::from_pointee(config));
    shutdown::spawn_reload_handler(shared.clone(), config_path, cancel.clone());

    let memory_task = tokio::spawn(memory_monitor(cancel.clone()));

    let sync_task = tokio::spawn(run_periodic(
        "sync",
        shared.clone(),
        Schedule::sync,
        move || {
            let synchronizer = synchronizer.clone();
            async move { synchronizer.sync_all().await }
        },
        cancel.clone(),
    ));

    let dispatch_task = tokio::spawn(run_periodic(
        "dispatch",
        shared.clone(),
        Schedule::dispatch,
        move || {
            let dispatcher = dispatcher.clone();
            async move { dispatcher.dispatch_pending().await }
        },
        cancel.clone(),
    ));

    cancel.cancelled().await;
    info!("waiting for in-flight passes to finish");

    for (name, task) in [("sync", sync_task), ("dispatch", dispatch_task), ("memory", memory_task)] {
        if let Err(e) = task.await {
            warn!(task = name, error = %e, "background task ended abnormally");
        }
    }

    app.connectors.shutdown_all().await;
    app.storage.shutdown().await?;
    info!("replyd serve shutdown complete");
    Ok(())
}

/// Log jemalloc heap statistics until `cancel` fires.
#[cfg(not(target_env = "msvc"))]
async fn memory_monitor(cancel: CancellationToken) {
    let mut interval = tokio::time::interval(MEMORY_LOG_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let _ = tikv_jemalloc_ctl::epoch::advance();
                let allocated = tikv_jemalloc_ctl::stats::allocated::read().unwrap_or(0);
                let resident = tikv_jemalloc_ctl::stats::resident::read().unwrap_or(0);
                debug!(
                    allocated_kb = allocated / 1024,
                    resident_kb = resident / 1024,
                    "memory usage"
                );
            }
            _ = cancel.cancelled() => break,
        }
    }
}

#[cfg(target_env = "msvc")]
async fn memory_monitor(cancel: CancellationToken) {
    let _ = MEMORY_LOG_INTERVAL;
    cancel.cancelled().await;
}
