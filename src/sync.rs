//! The background sync worker.
//!
//! A dedicated thread wakes on a fixed interval and calls the flush closure
//! it was given. Stopping is a buffered channel send plus a join, so asking
//! the worker to quit never blocks and never cuts off an in-flight write.

use crate::error::{Error, Result};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Background thread that runs a flush closure on a timer.
/// Joins the thread on drop so nothing leaks.
pub struct SyncWorker {
    stop_tx: mpsc::SyncSender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SyncWorker {
    /// Spawn the timer thread.
    ///
    /// Every `interval` the thread calls `tick`. A failed tick is logged and,
    /// when an error sink is given, forwarded with a non-blocking send; a
    /// full or dropped sink never stalls the timer, the error is dropped and
    /// the next tick happens on schedule.
    pub fn start<F>(interval: Duration, errors: Option<mpsc::SyncSender<Error>>, tick: F) -> Self
    where
        F: Fn() -> Result<()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::sync_channel::<()>(1);

        debug!(interval_ms = interval.as_millis() as u64, "sync worker starting");
        let handle = thread::Builder::new()
            .name("snapmap-sync".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            if let Err(err) = tick() {
                                warn!(error = %err, "periodic sync failed");
                                forward(&errors, err);
                            }
                        }
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("sync worker exiting");
            })
            .expect("failed to spawn sync thread");

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Ask the thread to exit and wait for it.
    ///
    /// An in-flight write finishes first. Safe to call more than once; later
    /// calls are no-ops.
    pub fn stop(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Whether the timer thread is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn forward(sink: &Option<mpsc::SyncSender<Error>>, err: Error) {
    if let Some(sink) = sink {
        match sink.try_send(err) {
            Ok(()) => {}
            Err(mpsc::TrySendError::Full(_)) => warn!("error sink full, dropping sync error"),
            Err(mpsc::TrySendError::Disconnected(_)) => {}
        }
    }
}
