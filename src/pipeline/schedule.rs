//! Refresh triggers.
//!
//! One refresh runs at startup, then one per interval. Manual triggers arrive
//! on a channel and do not reset the timer. Every trigger is handed to
//! [`RefreshController::refresh`], which drops it if a cycle is in flight.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::pipeline::refresh::{RefreshController, RefreshOutcome};

/// Where a trigger came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Manual,
}

/// Drive `controller` until `shutdown` resolves.
///
/// Cycles run as separate tasks so a slow fetch never delays the timer. On
/// shutdown no new cycles start and in-flight ones run to completion.
pub async fn run<F>(
    controller: Arc<RefreshController>,
    interval: Duration,
    mut triggers: mpsc::Receiver<()>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut cycles = JoinSet::new();
    let mut manual_open = true;

    log::info!("Refreshing every {}s", interval.as_secs());

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => spawn_cycle(&mut cycles, &controller, Trigger::Timer),
            trigger = triggers.recv(), if manual_open => match trigger {
                Some(()) => spawn_cycle(&mut cycles, &controller, Trigger::Manual),
                None => manual_open = false,
            },
            Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                if let Err(e) = joined {
                    log::error!("Refresh task failed: {e}");
                }
            }
        }
    }

    log::info!("Scheduler stopping; waiting for {} task(s)", cycles.len());
    while let Some(joined) = cycles.join_next().await {
        if let Err(e) = joined {
            log::error!("Refresh task failed: {e}");
        }
    }
}

fn spawn_cycle(
    cycles: &mut JoinSet<RefreshOutcome>,
    controller: &Arc<RefreshController>,
    trigger: Trigger,
) {
    log::debug!("{trigger:?} refresh triggered");
    let controller = Arc::clone(controller);
    cycles.spawn(async move { controller.refresh().await });
}
