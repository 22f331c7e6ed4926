//! Aggregator / reporter loop
//!
//! The single consumer of the file size stream. It owns the running totals
//! outright (no locks, no atomics) and waits on three things at once:
//!
//! - the next size, or the stream closing (normal termination)
//! - the report ticker, when periodic reporting is enabled
//! - the cancel signal
//!
//! Once cancellation is observed the loop stops counting but keeps reading
//! until the stream closes, so walker tasks blocked on a full channel can
//! finish and release their work guards.

use crate::cancel::CancelSignal;
use crate::walker::tree::SizeReceiver;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Files and bytes counted so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningTotals {
    pub files: u64,
    pub bytes: u64,
}

impl RunningTotals {
    pub fn record(&mut self, size: u64) {
        self.files += 1;
        self.bytes = self.bytes.saturating_add(size);
    }

    /// Decimal gigabytes (1 GB = 10^9 bytes)
    pub fn gigabytes(&self) -> f64 {
        self.bytes as f64 / 1e9
    }
}

/// How the aggregation loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub totals: RunningTotals,

    /// Cancellation was observed before the stream closed
    pub cancelled: bool,

    /// Sizes read and discarded after cancellation
    pub drained: u64,
}

/// Fan-in consumer for the file size stream
pub struct Aggregator {
    rx: SizeReceiver,
    cancel: CancelSignal,
    interval: Option<Duration>,
}

impl Aggregator {
    pub fn new(rx: SizeReceiver, cancel: CancelSignal) -> Self {
        Self {
            rx,
            cancel,
            interval: None,
        }
    }

    /// Hand a snapshot to the report callback every `interval`
    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.interval = interval;
        self
    }

    /// Consume the stream until it closes.
    ///
    /// `on_tick` receives a snapshot on every report tick; it never affects
    /// control flow.
    pub async fn run<F>(mut self, mut on_tick: F) -> AggregateOutcome
    where
        F: FnMut(&RunningTotals),
    {
        let mut totals = RunningTotals::default();

        let ticking = self.interval.is_some();
        let period = self.interval.unwrap_or(Duration::from_secs(3600));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                size = self.rx.recv() => match size {
                    Some(size) => totals.record(size),
                    None => break,
                },
                _ = ticker.tick(), if ticking => on_tick(&totals),
                _ = self.cancel.fired() => {
                    let drained = self.drain().await;
                    debug!(
                        files = totals.files,
                        drained,
                        "Cancellation observed, size stream drained"
                    );
                    return AggregateOutcome {
                        totals,
                        cancelled: true,
                        drained,
                    };
                }
            }
        }

        AggregateOutcome {
            totals,
            cancelled: false,
            drained: 0,
        }
    }

    /// Read and discard until every sender is gone
    async fn drain(&mut self) -> u64 {
        let mut drained = 0;
        while self.rx.recv().await.is_some() {
            drained += 1;
        }
        drained
    }
}
