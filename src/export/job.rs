//! Export job state and lifecycle.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, trace, warn};
use uuid::Uuid;

use crate::host::{OutputFs, SceneGraph};
use crate::scene::ObjectId;

use super::dedup::AssetDeduplicator;
use super::document::DocumentModel;
use super::inventory::InventoryCollector;
use super::progress::{ExportIssue, JobState, Progress, ProgressHandle};
use super::query::RemoteQueryTracker;
use super::settings::ExportSettings;
use super::walker::{LinksetPlan, PermissionFilter, SelectionWalker};
use super::{JobId, Reply};

/// What to export and where.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRequest {
    /// Selected linkset roots, in export order.
    pub selection: Vec<ObjectId>,
    /// Document path. Assets go into folders next to it.
    pub destination: PathBuf,
    /// Agent whose rights filter inventory items.
    pub agent_id: Uuid,
    /// Grid or environment label.
    pub environment: String,
}

impl ExportRequest {
    pub fn new(selection: Vec<ObjectId>, destination: impl Into<PathBuf>) -> Self {
        Self {
            selection,
            destination: destination.into(),
            agent_id: Uuid::nil(),
            environment: String::new(),
        }
    }

    pub fn agent(mut self, agent_id: Uuid) -> Self {
        self.agent_id = agent_id;
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Directory that holds textures, sculpt maps and inventory mirrors.
    pub fn asset_dir(&self) -> PathBuf {
        match self.destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Document name shown in the header: the file stem.
    pub fn document_name(&self) -> String {
        self.destination
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string())
    }
}

/// A linkset whose members are partly submitted.
#[derive(Debug)]
pub(super) struct ActiveLinkset {
    pub plan: LinksetPlan,
    pub next: usize,
    pub doc_index: usize,
}

/// A single export run and the state that outlives it.
///
/// The reply inbox belongs to the job object rather than to one run, so
/// remote implementations can hold a [`Sender`] across runs; replies from
/// an earlier run are recognised by their [`JobId`] and dropped.
pub struct ExportJob {
    pub(super) id: JobId,
    pub(super) state: JobState,
    pub(super) settings: ExportSettings,
    pub(super) request: Option<ExportRequest>,
    pub(super) queue: VecDeque<LinksetPlan>,
    pub(super) active: Option<ActiveLinkset>,
    pub(super) document: DocumentModel,
    pub(super) properties: RemoteQueryTracker,
    pub(super) inventory: InventoryCollector,
    pub(super) textures: AssetDeduplicator,
    pub(super) created_dirs: HashSet<PathBuf>,
    /// Authoritative counters; published to `shared` after each call.
    pub(super) stats: Progress,
    pub(super) shared: ProgressHandle,
    pub(super) finalize_count: u32,
    inbox_tx: Sender<Reply>,
    pub(super) inbox_rx: Receiver<Reply>,
}

impl Default for ExportJob {
    fn default() -> Self {
        Self::new(ExportSettings::default())
    }
}

impl ExportJob {
    pub fn new(settings: ExportSettings) -> Self {
        let (inbox_tx, inbox_rx) = channel();
        Self {
            id: 0,
            state: JobState::Idle,
            settings: settings.validate(),
            request: None,
            queue: VecDeque::new(),
            active: None,
            document: DocumentModel::new(),
            properties: RemoteQueryTracker::new(),
            inventory: InventoryCollector::new(),
            textures: AssetDeduplicator::new(),
            created_dirs: HashSet::new(),
            stats: Progress::default(),
            shared: Arc::new(RwLock::new(Progress::default())),
            finalize_count: 0,
            inbox_tx,
            inbox_rx,
        }
    }

    /// Sender for asynchronous replies. Drained at the start of every tick.
    pub fn reply_sender(&self) -> Sender<Reply> {
        self.inbox_tx.clone()
    }

    /// Begin a new run. A running job is discarded first.
    pub fn start(
        &mut self,
        request: ExportRequest,
        settings: ExportSettings,
        scene: &mut dyn SceneGraph,
    ) -> JobId {
        if self.state.is_running() {
            warn!("discarding running export job {}", self.id);
        }
        self.reset();
        self.settings = settings.validate();

        let walker = SelectionWalker::new(PermissionFilter {
            follow_permissions: self.settings.follow_permissions,
        });
        let walk = walker.walk(&request.selection, scene);
        for (id, reason) in &walk.skipped {
            self.stats.issues.push(ExportIssue::new(reason.message()).object(*id));
        }

        self.stats.linksets.total = walk.total_linksets;
        self.stats.prims.total = walk.total_objects;
        self.queue = walk.linksets.into();

        info!(
            "export job {} started: {} linksets, {} prims -> {}",
            self.id,
            self.stats.linksets.total,
            self.stats.prims.total,
            request.destination.display()
        );
        self.request = Some(request);
        self.state = JobState::SubmittingLinksets;
        self.publish();
        self.id
    }

    /// Abort the current run; stale replies will be dropped.
    pub fn stop(&mut self) {
        if self.state.is_running() {
            info!("export job {} stopped", self.id);
        }
        self.reset();
        self.publish();
    }

    /// Clear all per-run state and move to a fresh job id.
    pub fn reset(&mut self) {
        self.id += 1;
        self.state = JobState::Idle;
        self.request = None;
        self.queue.clear();
        self.active = None;
        self.document.clear();
        self.properties.clear();
        self.inventory.clear();
        self.textures.clear();
        self.created_dirs.clear();
        self.stats = Progress::default();
        self.finalize_count = 0;
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn document(&self) -> &DocumentModel {
        &self.document
    }

    /// Current counters.
    pub fn progress(&self) -> &Progress {
        &self.stats
    }

    /// Shared handle for observers on other threads.
    pub fn progress_handle(&self) -> ProgressHandle {
        Arc::clone(&self.shared)
    }

    /// Times the document was written this run (0 or 1).
    pub fn finalize_count(&self) -> u32 {
        self.finalize_count
    }

    pub fn pending_properties(&self) -> usize {
        self.properties.pending()
    }

    pub fn pending_inventory(&self) -> usize {
        self.inventory.pending()
    }

    pub(super) fn asset_dir(&self) -> PathBuf {
        self.request.as_ref().map_or_else(|| PathBuf::from("."), |r| r.asset_dir())
    }

    pub(super) fn agent_id(&self) -> Uuid {
        self.request.as_ref().map_or_else(Uuid::nil, |r| r.agent_id)
    }

    /// Create `dir` once per run.
    pub(super) fn ensure_dir(&mut self, dir: &Path, fs: &dyn OutputFs) {
        if self.created_dirs.contains(dir) {
            return;
        }
        match fs.create_dir_all(dir) {
            Ok(()) => {
                self.created_dirs.insert(dir.to_path_buf());
            }
            Err(e) => warn!("could not create {}: {}", dir.display(), e),
        }
    }

    pub(super) fn issue(&mut self, issue: ExportIssue) {
        warn!("{}", issue);
        self.stats.issues.push(issue);
    }

    /// Copy counters to the shared handle.
    pub(super) fn publish(&mut self) {
        self.stats.state = self.state;
        self.stats.pending_properties = self.properties.pending() as u32;
        self.stats.pending_inventory = self.inventory.pending() as u32;
        self.stats.properties.current = self.properties.settled();
        self.stats.inventories.current = self.inventory.settled();
        *self.shared.write() = self.stats.clone();
        trace!("{}", self.stats.status_text());
    }
}
