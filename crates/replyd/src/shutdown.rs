// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling: SIGTERM/SIGINT shut down, SIGHUP reloads configuration.

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use replyd_config::model::ReplydConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Reload configuration into `config` on every SIGHUP until `cancel` fires.
///
/// An invalid file keeps the running configuration. Storage and vault
/// settings only take effect on restart.
#[cfg(unix)]
pub fn spawn_reload_handler(
    config: Arc<ArcSwap<ReplydConfig>>,
    path: Option<PathBuf>,
    cancel: CancellationToken,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(sighup) => sighup,
        Err(e) => {
            warn!(error = %e, "failed to install SIGHUP handler, reload disabled");
            return;
        }
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = sighup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    reload(&config, path.as_deref());
                }
                _ = cancel.cancelled() => break,
            }
        }
        debug!("reload handler stopped");
    });
}

#[cfg(not(unix))]
pub fn spawn_reload_handler(
    _config: Arc<ArcSwap<ReplydConfig>>,
    _path: Option<PathBuf>,
    _cancel: CancellationToken,
) {
}

/// Load and validate configuration, swapping it in on success.
pub fn reload(config: &ArcSwap<ReplydConfig>, path: Option<&std::path::Path>) -> bool {
    let loaded = match path {
        Some(path) => replyd_config::load_and_validate_path(path),
        None => replyd_config::load_and_validate(),
    };
    match loaded {
        Ok(new_config) => {
            let old = config.load();
            if old.storage != new_config.storage || old.vault != new_config.vault {
                warn!("storage and vault changes apply after restart");
            }
            info!(
                sync_interval_secs = new_config.sync.interval_secs,
                dispatch_interval_secs = new_config.dispatch.interval_secs,
                "configuration reloaded"
            );
            config.store(Arc::new(new_config));
            true
        }
        Err(errors) => {
            error!(count = errors.len(), "configuration reload rejected, keeping current config");
            replyd_config::render_errors(&errors);
            false
        }
    }
}
