//! Cooperative cancellation
//!
//! [`CancelSignal`] is a one-shot broadcast event: once fired it stays fired,
//! and any number of tasks may poll it or await it. The walker checks it
//! before listing a directory and before spawning each subdirectory, the
//! bounded executor races it against permit acquisition, and the aggregator
//! switches to drain mode when it first observes it.
//!
//! The trigger helpers at the bottom of this module connect the signal to
//! the outside world (a keypress, Ctrl-C, a deadline). The walker itself
//! never knows which trigger fired.

use crate::error::{Result, WorkerError};
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Single-fire, idempotent cancellation event shared by every task of a run
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal.
    ///
    /// Returns `true` only for the call that actually fired it; every later
    /// call is a no-op returning `false`.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Non-blocking poll
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal has fired (immediately if it already has)
    pub async fn fired(&self) {
        self.token.cancelled().await
    }
}

/// Fire `signal` and announce it if this was the first trigger to do so
fn trigger(signal: &CancelSignal, reason: &'static str) {
    if signal.fire() {
        eprintln!("Cancelling...");
        info!(reason, "Cancellation requested");
    }
}

/// Cancel the run when a single byte arrives on stdin.
///
/// The read happens on a detached OS thread so it never holds up runtime
/// shutdown.
pub fn spawn_stdin_trigger(signal: CancelSignal) -> Result<()> {
    spawn_read_trigger(signal, std::io::stdin())?;
    Ok(())
}

/// Cancel the run when one byte can be read from `reader`.
///
/// End-of-file or a read error leaves the signal untouched.
pub fn spawn_read_trigger<R>(
    signal: CancelSignal,
    mut reader: R,
) -> Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("stdin-cancel".to_string())
        .spawn(move || {
            let mut byte = [0u8; 1];
            match reader.read(&mut byte) {
                Ok(1) => trigger(&signal, "keypress"),
                Ok(_) => debug!("stdin closed, keypress cancellation disabled"),
                Err(e) => debug!(error = %e, "stdin read failed, keypress cancellation disabled"),
            }
        })?;

    Ok(handle)
}

/// Cancel the run on Ctrl-C
pub fn install_interrupt_handler(signal: CancelSignal) -> Result<()> {
    ctrlc::set_handler(move || trigger(&signal, "interrupt"))
        .map_err(|e| WorkerError::SignalHandler(e.to_string()))?;

    Ok(())
}

/// Cancel the run once `after` has elapsed.
///
/// The task ends early if the signal fires for any other reason.
pub fn spawn_timeout(signal: CancelSignal, after: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(after) => trigger(&signal, "timeout"),
            _ = signal.fired() => {}
        }
    })
}
