//! Document lifecycle for the cockpit editor
//!
//! [`CockpitEditor`] owns the current document and routes every mutation
//! through one path:
//! - apply the change to the in-memory tree (with link propagation for
//!   element and sub-element updates)
//! - prune selection references the change left dangling
//! - trigger the autosave scheduler, debounced for field edits and
//!   immediate for creates, deletes, moves, links and bulk edits
//!
//! Mutations on ids that do not resolve are no-ops: they return `false`,
//! `None` or an empty report and schedule no save.

mod elements;
mod links;
mod structure;

use crate::config::EditorConfig;
use crate::error::{ConfigError, EditorError};
use crate::selection::Selection;
use cockpit_model::{Cockpit, CockpitSummary, EntityId};
use cockpit_sync::{
    AutosaveScheduler, DocumentSource, DrainReport, FileStorage, HttpTransport, LoadSource,
    MemoryStorage, Storage, SyncError, SyncService, SyncState,
};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How a mutation is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveMode {
    /// Restart the debounce timer
    Debounced,
    /// Cancel the timer and save now
    Immediate,
}

#[derive(Debug, Default)]
struct EditorState {
    current: Option<Cockpit>,
    cockpits: Vec<CockpitSummary>,
    selection: Selection,
}

fn remember(cockpits: &mut Vec<CockpitSummary>, summary: CockpitSummary) {
    match cockpits.iter_mut().find(|s| s.id == summary.id) {
        Some(existing) => *existing = summary,
        None => cockpits.push(summary),
    }
}

/// Editor over one current cockpit
#[derive(Clone)]
pub struct CockpitEditor {
    state: Arc<RwLock<EditorState>>,
    sync: SyncService,
    autosave: AutosaveScheduler,
}

impl std::fmt::Debug for CockpitEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CockpitEditor")
            .field("current", &state.current.as_ref().map(|c| &c.id))
            .field("cockpits", &state.cockpits.len())
            .field("autosave", &self.autosave)
            .finish_non_exhaustive()
    }
}

impl CockpitEditor {
    /// Editor saving through `sync` after `debounce` of quiet
    #[must_use]
    pub fn new(sync: SyncService, debounce: Duration) -> Self {
        let state = Arc::new(RwLock::new(EditorState::default()));
        let reader = Arc::clone(&state);
        let source: Arc<dyn DocumentSource> =
            Arc::new(move || -> Option<Cockpit> { reader.read().current.clone() });
        let autosave = AutosaveScheduler::new(debounce, source, Arc::new(sync.clone()));
        Self {
            state,
            sync,
            autosave,
        }
    }

    /// Build the full pipeline from config: storage, HTTP transport, sync
    ///
    /// The service is not started; call [`CockpitEditor::start`].
    ///
    /// # Errors
    /// Missing endpoint, storage directory failure or HTTP client setup
    pub fn from_config(config: &EditorConfig, token: Option<&str>) -> Result<Self, EditorError> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| ConfigError::Invalid {
            field: "endpoint",
            reason: "required to build the editor".into(),
        })?;
        let storage: Arc<dyn Storage> = match &config.storage_dir {
            Some(dir) => Arc::new(FileStorage::open(dir)?),
            None => Arc::new(MemoryStorage::new()),
        };
        let mut transport = HttpTransport::new(endpoint, config.sync.request_timeout)?;
        if let Some(token) = token {
            transport = transport.with_token(token);
        }
        let sync = SyncService::new(&config.sync, storage, Arc::new(transport))?;
        Ok(Self::new(sync, config.debounce))
    }

    /// Start draining whatever the sync queue restored
    pub fn start(&self) {
        self.sync.start();
    }

    /// Save any pending edit, then stop background sync work
    pub fn dispose(&self) {
        self.autosave.flush();
        self.sync.dispose();
    }

    /// Persistence service behind this editor
    #[must_use]
    pub fn sync(&self) -> &SyncService {
        &self.sync
    }

    /// Sync indicator snapshot
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    /// Sync state stream, starting with the current state
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.sync.subscribe()
    }

    /// Save a pending debounced edit now
    pub fn flush(&self) -> bool {
        self.autosave.flush()
    }

    /// Probe the server and drain the queue
    ///
    /// # Errors
    /// Health check failure
    pub async fn force_sync(&self) -> Result<DrainReport, SyncError> {
        self.autosave.flush();
        self.sync.force_sync().await
    }

    /// Fetch `id`, reconcile it with any local backup and make it current
    ///
    /// A pending edit on the previous document is saved first. When the
    /// backup wins it is pushed back to the server once.
    ///
    /// # Errors
    /// Server unreachable with no backup, or storage failure
    pub async fn load_cockpit(&self, id: &EntityId) -> Result<LoadSource, EditorError> {
        self.autosave.flush();
        let reconciled = self.sync.reconciler().load(id).await?;
        let resave = reconciled.needs_resave();
        let source = reconciled.source;

        let mut cockpit = reconciled.cockpit;
        cockpit.repair_parent_links();
        cockpit.normalize_orders();
        tracing::info!(cockpit = %cockpit.id, ?source, "cockpit loaded");
        self.install(cockpit);

        if resave {
            self.autosave.schedule_immediate();
        }
        Ok(source)
    }

    /// Make a locally built cockpit current without saving it
    pub fn open(&self, cockpit: Cockpit) {
        self.autosave.flush();
        self.install(cockpit);
    }

    /// Create an empty cockpit, make it current and save it
    pub fn create_cockpit(&self, name: impl Into<String>) -> EntityId {
        self.autosave.flush();
        let cockpit = Cockpit::new(name);
        let id = cockpit.id.clone();
        self.install(cockpit);
        self.autosave.schedule_immediate();
        id
    }

    /// Save pending edits and drop the current document
    pub fn close(&self) -> Option<Cockpit> {
        self.autosave.flush();
        let mut state = self.state.write();
        state.selection.clear();
        state.current.take()
    }

    /// Copy of the current document
    #[must_use]
    pub fn current(&self) -> Option<Cockpit> {
        self.state.read().current.clone()
    }

    /// Run a read-only query against the current document
    pub fn with_current<R>(&self, f: impl FnOnce(&Cockpit) -> R) -> Option<R> {
        self.state.read().current.as_ref().map(f)
    }

    /// Known cockpits, in the order first seen
    #[must_use]
    pub fn summaries(&self) -> Vec<CockpitSummary> {
        self.state.read().cockpits.clone()
    }

    /// Record cockpits known from elsewhere (e.g. a server listing)
    pub fn remember_cockpits(&self, summaries: impl IntoIterator<Item = CockpitSummary>) {
        let mut state = self.state.write();
        for summary in summaries {
            remember(&mut state.cockpits, summary);
        }
    }

    #[must_use]
    pub fn selection(&self) -> Selection {
        self.state.read().selection.clone()
    }

    /// Select a domain of the current document
    pub fn select_domain(&self, id: &EntityId) -> bool {
        self.select(|c| c.domain(id).is_some(), |s| s.domain = Some(id.clone()))
    }

    /// Select an element of the current document
    pub fn select_element(&self, id: &EntityId) -> bool {
        self.select(|c| c.element(id).is_some(), |s| s.element = Some(id.clone()))
    }

    /// Select a sub-element of the current document
    pub fn select_sub_element(&self, id: &EntityId) -> bool {
        self.select(|c| c.sub_element(id).is_some(), |s| s.sub_element = Some(id.clone()))
    }

    /// Select a map point of the current document
    pub fn select_map_element(&self, id: &EntityId) -> bool {
        self.select(|c| c.map_element(id).is_some(), |s| s.map_element = Some(id.clone()))
    }

    pub fn clear_selection(&self) {
        self.state.write().selection.clear();
    }

    fn select(&self, exists: impl FnOnce(&Cockpit) -> bool, set: impl FnOnce(&mut Selection)) -> bool {
        let mut state = self.state.write();
        let found = state.current.as_ref().is_some_and(exists);
        if found {
            set(&mut state.selection);
        }
        found
    }

    fn install(&self, cockpit: Cockpit) {
        let mut state = self.state.write();
        remember(&mut state.cockpits, cockpit.summary());
        state.selection.clear();
        state.current = Some(cockpit);
    }

    /// Apply `f` to the current document, then save per `mode`
    ///
    /// `f` returns its result and whether the document changed; unchanged
    /// documents are not saved. `None` when no document is loaded.
    fn edit<R>(
        &self,
        mode: SaveMode,
        f: impl FnOnce(&mut Cockpit, &mut Selection) -> (R, bool),
    ) -> Option<R> {
        let (result, changed) = {
            let mut guard = self.state.write();
            let EditorState {
                current,
                cockpits,
                selection,
            } = &mut *guard;
            let cockpit = current.as_mut()?;
            let (result, changed) = f(cockpit, selection);
            if changed {
                selection.prune(cockpit);
                remember(cockpits, cockpit.summary());
            }
            (result, changed)
        };
        // guard released: the scheduler reads the document itself
        if changed {
            self.save(mode);
        }
        Some(result)
    }

    /// [`CockpitEditor::edit`] for changes that either happen or not
    fn mutate<R>(
        &self,
        mode: SaveMode,
        f: impl FnOnce(&mut Cockpit, &mut Selection) -> Option<R>,
    ) -> Option<R> {
        self.edit(mode, |cockpit, selection| {
            let result = f(cockpit, selection);
            let changed = result.is_some();
            (result, changed)
        })
        .flatten()
    }

    fn save(&self, mode: SaveMode) {
        match mode {
            SaveMode::Debounced => self.autosave.schedule_debounced(),
            SaveMode::Immediate => self.autosave.schedule_immediate(),
        }
    }
}
