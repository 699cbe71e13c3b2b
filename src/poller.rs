//! Background polling of the optimizer statistics endpoint.
//!
//! A [`StatsPoller`] fetches once immediately on [`StatsPoller::start`], then
//! waits `interval` after each fetch settles before issuing the next, so at
//! most one fetch is ever in flight. Failures never surface as errors to the
//! caller: they are recorded in [`PollerStatus`] and polling carries on.
//! Once a snapshot has been obtained it is never cleared by a later failure.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::backend::StatsSource;
use crate::error::ConsoleError;
use crate::model::OptimizationSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    /// Not started yet, or stopped.
    Idle,
    /// First fetch in flight, no snapshot yet.
    Loading,
    /// Snapshot held. `last_error` may still carry a failed refresh.
    Ready,
    /// Fetch in flight while the previous snapshot stays visible.
    Refreshing,
    /// Every fetch so far has failed.
    Error,
}

#[derive(Debug, Clone)]
pub struct PollerStatus {
    pub phase: PollPhase,
    pub snapshot: Option<Arc<OptimizationSnapshot>>,
    pub last_error: Option<String>,
    /// Fetches that settled while the poller was active.
    pub fetch_count: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl PollerStatus {
    fn new() -> Self {
        Self {
            phase: PollPhase::Idle,
            snapshot: None,
            last_error: None,
            fetch_count: 0,
            last_success_at: None,
            last_attempt_at: None,
        }
    }

    /// Marks a fetch as in flight. Returns false once the poller is idle.
    fn begin_fetch(&mut self) -> bool {
        if self.phase == PollPhase::Idle {
            return false;
        }
        self.phase = if self.snapshot.is_some() {
            PollPhase::Refreshing
        } else {
            PollPhase::Loading
        };
        true
    }

    /// Applies a settled fetch. Results that arrive after stop are dropped.
    fn apply(&mut self, result: Result<OptimizationSnapshot, ConsoleError>) -> bool {
        if self.phase == PollPhase::Idle {
            return false;
        }

        let now = Utc::now();
        self.fetch_count += 1;
        self.last_attempt_at = Some(now);

        match result {
            Ok(snapshot) => {
                self.snapshot = Some(Arc::new(snapshot));
                self.last_error = None;
                self.last_success_at = Some(now);
                self.phase = PollPhase::Ready;
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                self.phase = if self.snapshot.is_some() {
                    PollPhase::Ready
                } else {
                    PollPhase::Error
                };
            }
        }
        true
    }
}

enum Lifecycle {
    NotStarted,
    Running { stop_tx: watch::Sender<bool> },
    Stopped,
}

pub struct StatsPoller<S> {
    source: Arc<S>,
    interval: Duration,
    status_tx: Arc<watch::Sender<PollerStatus>>,
    refresh: Arc<Notify>,
    lifecycle: Mutex<Lifecycle>,
}

impl<S: StatsSource> StatsPoller<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        let (status_tx, _) = watch::channel(PollerStatus::new());
        Self {
            source,
            interval,
            status_tx: Arc::new(status_tx),
            refresh: Arc::new(Notify::new()),
            lifecycle: Mutex::new(Lifecycle::NotStarted),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts polling on the current tokio runtime. The first fetch is
    /// issued right away.
    ///
    /// Returns false if the poller is already running or has been stopped;
    /// a stopped poller cannot be restarted.
    pub fn start(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        match *lifecycle {
            Lifecycle::NotStarted => {}
            Lifecycle::Running { .. } => {
                debug!("Stats poller already running");
                return false;
            }
            Lifecycle::Stopped => {
                warn!("Stats poller was stopped and cannot be restarted");
                return false;
            }
        }

        self.status_tx.send_modify(|s| s.phase = PollPhase::Loading);

        let (stop_tx, stop_rx) = watch::channel(false);
        let _handle: JoinHandle<()> = tokio::spawn(run_poll_loop(
            self.source.clone(),
            self.interval,
            self.status_tx.clone(),
            self.refresh.clone(),
            stop_rx,
        ));

        *lifecycle = Lifecycle::Running { stop_tx };
        info!("Stats poller started (every {}s)", self.interval.as_secs_f64());
        true
    }

    /// Stops polling. The pending timer is cancelled immediately; a fetch
    /// already in flight is left to finish but its result is discarded.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped);

        // Idle first, so the loop's next apply sees it under the same lock.
        self.status_tx.send_modify(|s| s.phase = PollPhase::Idle);

        if let Lifecycle::Running { stop_tx } = previous {
            let _ = stop_tx.send(true);
            info!("Stats poller stopped");
        }
    }

    /// Requests an immediate fetch (manual retry). Ignored unless running.
    pub fn refresh(&self) -> bool {
        let lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*lifecycle, Lifecycle::Running { .. }) {
            self.refresh.notify_one();
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        let lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*lifecycle, Lifecycle::Running { .. })
    }

    pub fn status(&self) -> PollerStatus {
        self.status_tx.borrow().clone()
    }

    /// Latest good snapshot, regardless of any later failures.
    pub fn snapshot(&self) -> Option<Arc<OptimizationSnapshot>> {
        self.status_tx.borrow().snapshot.clone()
    }

    /// Receives every state change.
    pub fn subscribe(&self) -> watch::Receiver<PollerStatus> {
        self.status_tx.subscribe()
    }
}

impl<S> Drop for StatsPoller<S> {
    fn drop(&mut self) {
        let lifecycle = self.lifecycle.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Lifecycle::Running { stop_tx } = std::mem::replace(lifecycle, Lifecycle::Stopped) {
            self.status_tx.send_modify(|s| s.phase = PollPhase::Idle);
            let _ = stop_tx.send(true);
        }
    }
}

async fn run_poll_loop<S: StatsSource>(
    source: Arc<S>,
    interval: Duration,
    status_tx: Arc<watch::Sender<PollerStatus>>,
    refresh: Arc<Notify>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        if !status_tx.send_if_modified(PollerStatus::begin_fetch) {
            break;
        }

        let result = source.fetch_stats().await;
        match &result {
            Ok(_) => debug!("Optimization stats refreshed"),
            Err(e) => warn!("Optimization stats fetch failed: {}", e),
        }

        if !status_tx.send_if_modified(|s| s.apply(result)) {
            debug!("Discarding stats fetch that settled after stop");
            break;
        }

        tokio::select! {
            _ = sleep(interval) => {}
            _ = refresh.notified() => debug!("Manual stats refresh requested"),
            _ = stop_rx.changed() => break,
        }
    }
    debug!("Stats poll loop exited");
}
