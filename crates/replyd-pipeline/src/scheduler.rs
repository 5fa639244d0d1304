// SPDX-FileCopyrightText: 2026 replyd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic task runner.
//!
//! Runs a pass, then sleeps for the interval read from the current config
//! snapshot. A reloaded interval or `enabled` flag takes effect on the next
//! tick without restarting the task. Passes never overlap.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use replyd_config::model::ReplydConfig;
use replyd_core::ReplydError;

/// What a periodic task should do on its next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub enabled: bool,
    pub interval: Duration,
}

impl Schedule {
    pub fn sync(config: &ReplydConfig) -> Self {
        Self {
            enabled: config.sync.enabled,
            interval: config.sync.interval(),
        }
    }

    pub fn dispatch(config: &ReplydConfig) -> Self {
        Self {
            enabled: config.dispatch.enabled,
            interval: config.dispatch.interval(),
        }
    }
}

/// Run `pass` until `cancel` fires.
///
/// A failed pass is logged and retried on the next tick. A pass in progress
/// is allowed to finish before the loop observes cancellation.
pub async fn run_periodic<P, Fut, T>(
    name: &'static str,
    config: Arc<ArcSwap<ReplydConfig>>,
    schedule: fn(&ReplydConfig) -> Schedule,
    mut pass: P,
    cancel: CancellationToken,
) where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReplydError>>,
    T: Debug,
{
    info!(task = name, "periodic task started");
    loop {
        let current = schedule(&config.load());
        if current.enabled {
            match pass().await {
                Ok(report) => debug!(task = name, ?report, "periodic pass finished"),
                Err(e) => error!(task = name, error = %e, "periodic pass failed"),
            }
        } else {
            debug!(task = name, "periodic task disabled, skipping tick");
        }

        // Re-read so a reload during the pass shortens or stretches this wait.
        let wait = schedule(&config.load()).interval;
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.cancelled() => break,
        }
    }
    info!(task = name, "periodic task shutting down");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn config_with_sync(interval_secs: u64, enabled: bool) -> ReplydConfig {
        let mut config = ReplydConfig::default();
        config.sync.interval_secs = interval_secs;
        config.sync.enabled = enabled;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_every_interval() {
        let config = Arc::new(ArcSwap::from_pointee(config_with_sync(10, true)));
        let passes = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let counter = passes.clone();
        let task = tokio::spawn(run_periodic(
            "test",
            config,
            Schedule::sync,
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ReplydError>(())
                }
            },
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(25)).await;
        cancel.cancel();
        task.await.unwrap();
        assert_eq!(passes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reloaded_interval_applies_next_tick() {
        let config = Arc::new(ArcSwap::from_pointee(config_with_sync(100, true)));
        let passes = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let counter = passes.clone();
        let task = tokio::spawn(run_periodic(
            "test",
            config.clone(),
            Schedule::sync,
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ReplydError>(())
                }
            },
            cancel.clone(),
        ));

        // First pass has run and the task is waiting out the 100s interval.
        tokio::time::sleep(Duration::from_secs(1)).await;
        config.store(Arc::new(config_with_sync(5, true)));
        tokio::time::sleep(Duration::from_secs(100)).await;
        // Pass at 100s, then every 5s after that.
        let after_reload = passes.load(Ordering::SeqCst);
        assert!(after_reload >= 2, "got {after_reload}");

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(passes.load(Ordering::SeqCst) >= after_reload + 3);
        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failures_and_disabled_ticks_keep_the_loop_alive() {
        let config = Arc::new(ArcSwap::from_pointee(config_with_sync(1, false)));
        let passes = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let counter = passes.clone();
        let task = tokio::spawn(run_periodic(
            "test",
            config.clone(),
            Schedule::sync,
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(ReplydError::Internal("boom".into()))
                }
            },
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(passes.load(Ordering::SeqCst), 0);

        config.store(Arc::new(config_with_sync(1, true)));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(passes.load(Ordering::SeqCst) >= 2);

        cancel.cancel();
        task.await.unwrap();
    }
}
