//! Sync service
//!
//! Owns the persistence pipeline for cockpit documents:
//!
//! ```text
//! persist(doc) → backup snapshot → enqueue (coalescing) → drain
//! drain: front entry → PUT → success | conflict | drop | retry after backoff
//! ```
//!
//! # Concurrency
//!
//! - At most one drain runs at a time, so writes go out strictly FIFO with
//!   one request in flight
//! - A drain stops when the service goes offline or schedules a retry;
//!   it resumes on reconnect, on timer expiry, or on the next enqueue
//! - Retry timers are the only background tasks; `dispose` aborts them
//!
//! The service is an explicitly constructed handle (cheap to clone) rather
//! than a global: construct it, call [`SyncService::start`], and
//! [`SyncService::dispose`] when the document lifecycle ends.

use crate::backup::BackupStore;
use crate::config::{RetryPolicy, SyncConfig};
use crate::error::{StorageError, SyncError};
use crate::queue::{Enqueued, OfflineQueue, PendingWrite, WriteId};
use crate::reconcile::Reconciler;
use crate::state::{StateCell, SyncState};
use crate::storage::Storage;
use crate::transport::{Transport, WriteOutcome};
use chrono::Utc;
use cockpit_model::Cockpit;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Tally of one drain pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Writes confirmed by the server
    pub sent: usize,
    /// Writes answered with 409 and removed
    pub conflicts: usize,
    /// Writes dropped without delivery
    pub dropped: usize,
    /// Backoff before the next attempt, if a retry was scheduled
    pub retry_in: Option<Duration>,
}

#[derive(Debug, Default)]
struct DrainControl {
    running: bool,
    in_flight: Option<WriteId>,
    retry_timer: Option<JoinHandle<()>>,
}

struct Inner {
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
    backups: BackupStore,
    queue: Mutex<OfflineQueue>,
    drain: Mutex<DrainControl>,
    state: StateCell,
    disposed: AtomicBool,
}

/// Handle to the persistence pipeline
#[derive(Clone)]
pub struct SyncService {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("state", &self.inner.state.snapshot())
            .finish_non_exhaustive()
    }
}

impl SyncService {
    /// Build a service over `storage`, restoring any durable queue
    ///
    /// # Errors
    /// Storage read failure while restoring the queue
    pub fn new(
        config: &SyncConfig,
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, SyncError> {
        let queue = OfflineQueue::load(Arc::clone(&storage))?;
        let state = StateCell::new(SyncState {
            pending_count: queue.len(),
            ..SyncState::default()
        });
        Ok(Self {
            inner: Arc::new(Inner {
                policy: config.retry_policy(),
                transport,
                backups: BackupStore::new(storage),
                queue: Mutex::new(queue),
                drain: Mutex::new(DrainControl::default()),
                state,
                disposed: AtomicBool::new(false),
            }),
        })
    }

    /// Begin draining whatever was restored from storage
    pub fn start(&self) {
        self.inner.disposed.store(false, Ordering::SeqCst);
        let pending = self.inner.queue.lock().len();
        tracing::info!(pending, "sync service started");
        if pending > 0 {
            self.inner.kick();
        }
    }

    /// Stop background work; queued writes stay in storage
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        if let Some(timer) = self.inner.drain.lock().retry_timer.take() {
            timer.abort();
        }
        self.inner.state.update(|s| s.is_syncing = false);
        tracing::info!("sync service disposed");
    }

    /// Current state snapshot
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.inner.state.snapshot()
    }

    /// Stream of state transitions, starting with the current state
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// Backup store shared with the pipeline
    #[must_use]
    pub fn backups(&self) -> &BackupStore {
        &self.inner.backups
    }

    /// Transport shared with the pipeline
    #[must_use]
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.inner.transport)
    }

    /// Load-time reconciler over the same transport and backups
    #[must_use]
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.transport(), self.inner.backups.clone())
    }

    /// Copies of every queued write, oldest first
    #[must_use]
    pub fn pending(&self) -> Vec<PendingWrite> {
        self.inner.queue.lock().iter().cloned().collect()
    }

    /// Run the persistence pipeline for `cockpit`
    ///
    /// Takes the backup first, then queues the write and starts a drain in
    /// the background when online. Never blocks on the network.
    pub fn persist(&self, cockpit: &Cockpit) {
        let write = PendingWrite::update(cockpit);
        let result = {
            // backup and enqueue under the queue lock so a completing drain
            // never clears a snapshot whose write is not queued yet
            let ctl = self.inner.drain.lock();
            let mut queue = self.inner.queue.lock();
            if let Err(e) = self.inner.backups.save_at(cockpit, write.payload.client_updated_at) {
                tracing::warn!(cockpit = %cockpit.id, error = %e, "backup failed");
            }
            queue.enqueue(write, ctl.in_flight.as_ref())
        };
        self.inner.refresh_pending();
        match result {
            Ok(outcome) => tracing::debug!(cockpit = %cockpit.id, ?outcome, "write queued"),
            Err(e) => tracing::warn!(cockpit = %cockpit.id, error = %e, "queue not persisted"),
        }
        self.inner.kick();
    }

    /// Queue a write without starting a drain
    ///
    /// # Errors
    /// Storage failure while persisting the queue; the write is still
    /// queued in memory
    pub fn enqueue(&self, write: PendingWrite) -> Result<Enqueued, StorageError> {
        let cockpit = write.cockpit_id.clone();
        let result = {
            // drain lock first: the in-flight id must not change mid-enqueue
            let ctl = self.inner.drain.lock();
            self.inner.queue.lock().enqueue(write, ctl.in_flight.as_ref())
        };
        self.inner.refresh_pending();
        if let Ok(outcome) = &result {
            tracing::debug!(%cockpit, ?outcome, "write queued");
        }
        result
    }

    /// Drain the queue now, in the caller's task
    ///
    /// Returns an empty report if a drain is already running or a retry is
    /// waiting on its backoff.
    pub async fn process_queue(&self) -> DrainReport {
        if !self.inner.try_begin(false) {
            return DrainReport::default();
        }
        self.inner.run_drain().await
    }

    /// Record a connectivity change
    ///
    /// Coming back online cancels any backoff and drains immediately.
    pub fn set_online(&self, online: bool) {
        let was = self.inner.state.snapshot().is_online;
        self.inner.state.update(|s| s.is_online = online);
        if online && !was {
            tracing::info!("connection restored");
            self.inner.cancel_retry();
            self.inner.kick();
        } else if !online && was {
            tracing::warn!("connection lost, writes will be queued");
        }
    }

    /// Probe the server, then drain if it answered
    ///
    /// # Errors
    /// The health check's transport error; the service is marked offline
    pub async fn force_sync(&self) -> Result<DrainReport, SyncError> {
        if let Err(e) = self.inner.transport.health_check().await {
            tracing::warn!(error = %e, "health check failed");
            self.set_online(false);
            return Err(e.into());
        }
        self.inner.state.update(|s| s.is_online = true);
        self.inner.cancel_retry();
        Ok(self.process_queue().await)
    }
}

impl Inner {
    /// Claim the drain; `from_timer` marks a retry timer firing
    fn try_begin(&self, from_timer: bool) -> bool {
        let mut ctl = self.drain.lock();
        if ctl.running {
            return false;
        }
        if from_timer {
            ctl.retry_timer = None;
        } else if ctl.retry_timer.is_some() {
            return false;
        }
        ctl.running = true;
        true
    }

    fn cancel_retry(&self) {
        if let Some(timer) = self.drain.lock().retry_timer.take() {
            timer.abort();
        }
    }

    fn refresh_pending(&self) {
        let pending = self.queue.lock().len();
        self.state.update(|s| s.pending_count = pending);
    }

    /// Start a background drain if online and idle
    fn kick(self: &Arc<Self>) {
        if self.disposed.load(Ordering::SeqCst) || !self.state.snapshot().is_online {
            return;
        }
        if !self.try_begin(false) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no async runtime, write stays queued");
            self.drain.lock().running = false;
            return;
        };
        let inner = Arc::clone(self);
        runtime.spawn(async move {
            inner.run_drain().await;
        });
    }

    /// Arm the retry timer; the drain restarts when it fires
    fn schedule_retry(self: &Arc<Self>, delay: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let inner = Arc::clone(self);
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if inner.try_begin(true) {
                inner.run_drain().await;
            }
        });
        if let Some(previous) = self.drain.lock().retry_timer.replace(timer) {
            previous.abort();
        }
    }

    /// Next entry to send, or release the drain if there is none
    ///
    /// Emptiness is checked under the drain lock so a concurrent enqueue
    /// either sees the drain running or finds it released.
    fn next_or_release(&self) -> Option<PendingWrite> {
        let mut ctl = self.drain.lock();
        let stop = self.disposed.load(Ordering::SeqCst) || !self.state.snapshot().is_online;
        let next = if stop { None } else { self.queue.lock().front().cloned() };
        match &next {
            Some(write) => ctl.in_flight = Some(write.id.clone()),
            None => {
                ctl.running = false;
                ctl.in_flight = None;
            }
        }
        next
    }

    fn release(&self) {
        let mut ctl = self.drain.lock();
        ctl.running = false;
        ctl.in_flight = None;
    }

    async fn run_drain(self: &Arc<Self>) -> DrainReport {
        let mut report = DrainReport::default();
        self.state.update(|s| s.is_syncing = true);

        while let Some(write) = self.next_or_release() {
            let result = self
                .transport
                .put_cockpit(&write.cockpit_id, &write.payload)
                .await;
            let outcome = WriteOutcome::classify(result);

            match outcome {
                WriteOutcome::Success | WriteOutcome::Conflict => {
                    self.complete(&write, &outcome);
                    if outcome == WriteOutcome::Conflict {
                        report.conflicts += 1;
                    } else {
                        report.sent += 1;
                    }
                }
                WriteOutcome::PayloadTooLarge => {
                    tracing::error!(
                        cockpit = %write.cockpit_id,
                        bytes = write.payload.encoded_len(),
                        "payload too large, write dropped"
                    );
                    self.drop_write(&write, "payload too large".to_string());
                    report.dropped += 1;
                }
                WriteOutcome::Rejected { status, message } => {
                    tracing::error!(cockpit = %write.cockpit_id, status, %message, "write rejected");
                    self.drop_write(&write, message);
                    report.dropped += 1;
                }
                WriteOutcome::Retry { reason } => {
                    let failures = match self.queue.lock().record_failure(&write.id, reason.clone()) {
                        Ok(count) => count.unwrap_or(write.retry_count + 1),
                        Err(e) => {
                            tracing::warn!(error = %e, "queue not persisted");
                            write.retry_count + 1
                        }
                    };
                    if self.policy.is_exhausted(failures) {
                        tracing::error!(cockpit = %write.cockpit_id, failures, %reason, "retries exhausted, write dropped");
                        self.drop_write(&write, reason);
                        report.dropped += 1;
                        continue;
                    }
                    let delay = self.policy.delay_for(failures);
                    tracing::warn!(
                        cockpit = %write.cockpit_id,
                        failures,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %reason,
                        "write failed, retry scheduled"
                    );
                    self.state.update(|s| s.last_error = Some(reason));
                    self.schedule_retry(delay);
                    self.release();
                    report.retry_in = Some(delay);
                    break;
                }
            }
        }

        self.state.update(|s| s.is_syncing = false);
        report
    }

    /// Remove a delivered write; clear the backup if nothing else is pending
    ///
    /// Runs under the queue lock, the same lock `persist` holds while it
    /// snapshots and enqueues.
    fn complete(&self, write: &PendingWrite, outcome: &WriteOutcome) {
        let pending = {
            let mut queue = self.queue.lock();
            if let Err(e) = queue.remove(&write.id) {
                tracing::warn!(error = %e, "queue not persisted");
            }
            if outcome == &WriteOutcome::Conflict {
                tracing::warn!(cockpit = %write.cockpit_id, "server reported conflict, keeping local copy");
            } else {
                tracing::info!(cockpit = %write.cockpit_id, "cockpit synced");
                if !queue.has_pending_for(&write.cockpit_id) {
                    self.clear_delivered_backup(write);
                }
            }
            queue.len()
        };

        self.state.update(|s| {
            s.pending_count = pending;
            s.last_sync_time = Some(Utc::now());
            s.last_error = None;
        });
    }

    /// Clear the backup unless it was taken after `write`'s snapshot
    fn clear_delivered_backup(&self, write: &PendingWrite) {
        match self.backups.load(&write.cockpit_id) {
            Ok(Some(backup)) if backup.backed_up_at > write.payload.client_updated_at => {
                tracing::debug!(cockpit = %write.cockpit_id, "backup is newer than the delivered write, kept");
            }
            Ok(None) => {}
            Ok(Some(_)) | Err(_) => {
                if let Err(e) = self.backups.clear(&write.cockpit_id) {
                    tracing::warn!(error = %e, "backup not cleared");
                }
            }
        }
    }

    fn drop_write(&self, write: &PendingWrite, error: String) {
        let pending = {
            let mut queue = self.queue.lock();
            if let Err(e) = queue.remove(&write.id) {
                tracing::warn!(error = %e, "queue not persisted");
            }
            queue.len()
        };
        self.state.update(|s| {
            s.pending_count = pending;
            s.last_error = Some(error);
        });
    }
}
