//! Single-flight, debounced background pusher.
//!
//! # Responsibility
//! - Coalesce rapid store changes into one push of the newest snapshot.
//! - Run pushes on one dedicated thread so requests never overlap.
//! - Expose the latest sync status to callers.
//!
//! # Invariants
//! - At most one push is in flight at any time.
//! - A snapshot scheduled while a push is in flight produces exactly one
//!   follow-up push after it completes; older pending snapshots are dropped.
//! - On shutdown, a pending snapshot is pushed once before the thread exits.

use super::document::push_store;
use super::remote::RemoteFileStore;
use crate::app::SyncStatus;
use chrono::Utc;
use log::{debug, info};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Quiet period before a scheduled snapshot is pushed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
struct WorkerState {
    pending: Option<String>,
    due_at: Option<Instant>,
    in_flight: bool,
    status: SyncStatus,
    shutdown: bool,
    pushes_completed: u64,
}

impl WorkerState {
    fn is_idle(&self) -> bool {
        self.pending.is_none() && !self.in_flight
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<WorkerState>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the background sync thread.
///
/// Dropping the handle stops the thread after pushing any pending snapshot.
pub struct SyncWorker {
    shared: Arc<Shared>,
    debounce: Duration,
    thread: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Starts the worker thread pushing to `remote`.
    pub fn spawn(remote: Arc<dyn RemoteFileStore>, debounce: Duration) -> std::io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let thread_shared = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("storycards-sync".to_string())
            .spawn(move || run(&thread_shared, remote.as_ref()))?;
        info!(
            "event=sync_worker_start module=sync status=ok debounce_ms={}",
            debounce.as_millis()
        );
        Ok(Self {
            shared,
            debounce,
            thread: Some(thread),
        })
    }

    /// Schedules `snapshot` after the debounce period.
    ///
    /// Replaces any snapshot still waiting and re-arms the timer.
    pub fn schedule(&self, snapshot: String) {
        self.enqueue(snapshot, Instant::now() + self.debounce);
    }

    /// Schedules `snapshot` for immediate push.
    pub fn schedule_now(&self, snapshot: String) {
        self.enqueue(snapshot, Instant::now());
    }

    /// Latest status observed by the worker.
    pub fn status(&self) -> SyncStatus {
        self.shared.lock().status
    }

    /// Returns `true` when nothing is pending or in flight.
    pub fn is_idle(&self) -> bool {
        self.shared.lock().is_idle()
    }

    /// Number of push attempts finished so far, successful or not.
    pub fn pushes_completed(&self) -> u64 {
        self.shared.lock().pushes_completed
    }

    /// Blocks until idle or until `timeout` elapses; returns the status.
    pub fn wait_idle(&self, timeout: Duration) -> SyncStatus {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        while !state.is_idle() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            state = self
                .shared
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        state.status
    }

    /// Pushes any pending snapshot now and waits for completion.
    pub fn flush(&self, timeout: Duration) -> SyncStatus {
        {
            let mut state = self.shared.lock();
            if state.pending.is_some() {
                state.due_at = Some(Instant::now());
                self.shared.changed.notify_all();
            }
        }
        self.wait_idle(timeout)
    }

    fn enqueue(&self, snapshot: String, due_at: Instant) {
        let mut state = self.shared.lock();
        let replaced = state.pending.replace(snapshot).is_some();
        state.due_at = Some(due_at);
        debug!(
            "event=sync_schedule module=sync status=ok replaced_pending={} in_flight={}",
            replaced, state.in_flight
        );
        self.shared.changed.notify_all();
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
            self.shared.changed.notify_all();
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        info!("event=sync_worker_stop module=sync status=ok");
    }
}

fn run(shared: &Shared, remote: &dyn RemoteFileStore) {
    let mut state = shared.lock();
    loop {
        if state.pending.is_none() {
            if state.shutdown {
                break;
            }
            state = shared
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        }

        let now = Instant::now();
        let due_at = state.due_at.unwrap_or(now);
        if now < due_at && !state.shutdown {
            state = shared
                .changed
                .wait_timeout(state, due_at - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            continue;
        }

        let Some(snapshot) = state.pending.take() else {
            continue;
        };
        state.due_at = None;
        state.in_flight = true;
        state.status = SyncStatus::Syncing;
        shared.changed.notify_all();
        drop(state);

        let result = push_store(remote, &snapshot, Utc::now());

        state = shared.lock();
        state.in_flight = false;
        state.pushes_completed += 1;
        state.status = match result {
            Ok(_) => SyncStatus::Synced,
            Err(_) => SyncStatus::Error,
        };
        shared.changed.notify_all();
    }
}
