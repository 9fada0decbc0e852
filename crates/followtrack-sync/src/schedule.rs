//! The schedule loop: one batch pass per tick until told to stop.
//!
//! The loop only looks at its stop signal between passes. A pass that has
//! started always runs every account to completion.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::engine::SyncEngine;
use crate::error::SyncError;

/// Async source of ticks. `None` means the source is exhausted.
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self) -> Option<()>;
}

/// [`Ticker`] fed through a bounded channel; the server's cron job holds the
/// sender.
#[derive(Debug)]
pub struct ChannelTicker {
    rx: mpsc::Receiver<()>,
}

impl ChannelTicker {
    #[must_use]
    pub fn new(buffer: usize) -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }
}

#[async_trait]
impl Ticker for ChannelTicker {
    async fn tick(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}

/// Runs a pass per tick until `stop` flips to `true`, its sender is dropped,
/// or the ticker is exhausted. Returns the number of passes started.
///
/// Pass errors are logged and never end the loop.
pub async fn run_schedule<T: Ticker>(
    engine: Arc<SyncEngine>,
    mut ticker: T,
    mut stop: watch::Receiver<bool>,
) -> usize {
    let mut passes = 0;
    tracing::info!("scheduler: loop started");

    loop {
        if *stop.borrow() {
            break;
        }

        let ticked = tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            tick = ticker.tick() => tick.is_some(),
        };
        if !ticked {
            tracing::info!("scheduler: ticker closed");
            break;
        }

        passes += 1;
        match engine.run_batch().await {
            Ok(report) => tracing::info!(pass = passes, ?report, "scheduler: pass finished"),
            Err(SyncError::AlreadyRunning) => {
                tracing::warn!(pass = passes, "scheduler: previous pass still running, tick skipped");
            }
            Err(e) => tracing::error!(pass = passes, error = %e, "scheduler: pass failed"),
        }
    }

    tracing::info!(passes, "scheduler: loop stopped");
    passes
}
