//! Autosave scheduling
//!
//! One trailing-edge debounce timer per scheduler. Rescheduling aborts the
//! outstanding timer; when a timer fires it asks the [`DocumentSource`] for
//! the document as it is *then*, not as it was when scheduled.
//!
//! [`AutosaveScheduler::schedule_immediate`] cancels the timer and runs the
//! pipeline synchronously, for creates, deletes, links and bulk edits.

use crate::service::SyncService;
use cockpit_model::Cockpit;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Supplies the current document at save time
pub trait DocumentSource: Send + Sync {
    /// Latest document, or `None` when nothing is loaded
    fn snapshot(&self) -> Option<Cockpit>;
}

impl<F> DocumentSource for F
where
    F: Fn() -> Option<Cockpit> + Send + Sync,
{
    fn snapshot(&self) -> Option<Cockpit> {
        self()
    }
}

/// Receives documents to persist
pub trait SaveSink: Send + Sync {
    fn persist(&self, cockpit: &Cockpit);
}

impl SaveSink for SyncService {
    fn persist(&self, cockpit: &Cockpit) {
        SyncService::persist(self, cockpit);
    }
}

#[derive(Default)]
struct Timer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

struct Inner {
    delay: Duration,
    source: Arc<dyn DocumentSource>,
    sink: Arc<dyn SaveSink>,
    timer: Mutex<Timer>,
}

impl Inner {
    fn fire(&self) {
        match self.source.snapshot() {
            Some(cockpit) => {
                tracing::debug!(cockpit = %cockpit.id, "autosave");
                self.sink.persist(&cockpit);
            }
            None => tracing::debug!("autosave skipped, no document"),
        }
    }
}

/// Debounced and immediate save triggers
#[derive(Clone)]
pub struct AutosaveScheduler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AutosaveScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosaveScheduler")
            .field("delay", &self.inner.delay)
            .field("pending", &self.has_pending())
            .finish()
    }
}

impl AutosaveScheduler {
    #[must_use]
    pub fn new(delay: Duration, source: Arc<dyn DocumentSource>, sink: Arc<dyn SaveSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay,
                source,
                sink,
                timer: Mutex::new(Timer::default()),
            }),
        }
    }

    /// Debounce delay
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// (Re)start the debounce timer
    ///
    /// Outside an async runtime there is no timer to arm, so the save runs
    /// immediately instead.
    pub fn schedule_debounced(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no async runtime, saving immediately");
            self.schedule_immediate();
            return;
        };

        let mut timer = self.inner.timer.lock();
        if let Some(previous) = timer.handle.take() {
            previous.abort();
        }
        timer.generation = timer.generation.wrapping_add(1);
        let generation = timer.generation;

        let inner = Arc::clone(&self.inner);
        timer.handle = Some(runtime.spawn(async move {
            tokio::time::sleep(inner.delay).await;
            {
                let mut timer = inner.timer.lock();
                if timer.generation != generation {
                    return;
                }
                timer.handle = None;
            }
            inner.fire();
        }));
    }

    /// Cancel any pending timer and save now
    pub fn schedule_immediate(&self) {
        self.cancel();
        self.inner.fire();
    }

    /// Cancel the pending timer; returns whether one was outstanding
    pub fn cancel(&self) -> bool {
        let mut timer = self.inner.timer.lock();
        timer.generation = timer.generation.wrapping_add(1);
        match timer.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Save now if a debounced save is pending
    pub fn flush(&self) -> bool {
        let pending = self.cancel();
        if pending {
            self.inner.fire();
        }
        pending
    }

    /// True while a debounce timer is outstanding
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.inner.timer.lock().handle.is_some()
    }
}
