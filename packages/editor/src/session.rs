//! # Edit Session
//!
//! One editing session owns exactly one document with its history, id
//! generator, drag coordinator, projection cache and (optionally) an
//! autosave task. Sessions are created and closed explicitly; the schema
//! registry is the only thing shared between them.

use crate::autosave::{Autosaver, PersistenceEvent};
use crate::config::EditorConfig;
use crate::drag::{DragCoordinator, DragOutcome, DragSource, DropIndicator, DropIntent};
use crate::errors::EditorError;
use crate::history::{History, Snapshot, SnapshotId};
use crate::hit::{LayoutHints, Point};
use crate::mutations::{MutationEngine, MutationError, MutationResult, NodeTemplate};
use crate::projection::{ProjectionMode, Projector, RenderTree, UiState};
use crate::storage::{DocumentStore, StorageError};
use pagecraft_document::{check_invariants, Document, IdGenerator, NodeId};
use pagecraft_schema::{Props, SchemaRegistry};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

pub struct EditSession {
    /// Unique session identifier
    pub id: String,
    page_id: String,
    registry: Arc<SchemaRegistry>,
    engine: MutationEngine,
    document: Document,
    history: History,
    drag: DragCoordinator,
    projector: Projector,

    /// Canvas projection used for drop targets; never filtered by search
    drop_projector: Projector,
    ui: UiState,
    autosave: Option<Autosaver>,
    config: EditorConfig,
}

impl EditSession {
    /// Start a session over an existing document.
    ///
    /// The document must satisfy every structural invariant.
    pub fn new(
        page_id: impl Into<String>,
        document: Document,
        registry: Arc<SchemaRegistry>,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let page_id = page_id.into();
        let violations = check_invariants(&document, &registry);
        if !violations.is_empty() {
            return Err(EditorError::InvalidDocument(violations));
        }

        let mut ids = IdGenerator::new(&page_id);
        ids.reserve(document.node_ids());

        let id = format!("{}-{}", page_id, chrono::Utc::now().timestamp_millis());
        info!(session = %id, page_id = %page_id, nodes = document.len(), "Session opened");

        Ok(Self {
            id,
            engine: MutationEngine::new(registry.clone(), ids),
            projector: Projector::new(registry.clone()),
            drop_projector: Projector::new(registry.clone()),
            history: History::new(config.history_limit),
            drag: DragCoordinator::new(),
            ui: UiState::default(),
            autosave: None,
            page_id,
            registry,
            document,
            config,
        })
    }

    /// Load a page (an unknown page starts empty) and autosave it back to
    /// the same store.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        page_id: &str,
        registry: Arc<SchemaRegistry>,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let document = match store.load(page_id).await {
            Ok(document) => document,
            Err(StorageError::NotFound(_)) => {
                debug!(page_id, "No stored page, starting empty");
                Document::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut session = Self::new(page_id, document, registry, config)?;
        session.attach_autosave(store);
        Ok(session)
    }

    /// Persist every future change through `store`, debounced.
    pub fn attach_autosave(&mut self, store: Arc<dyn DocumentStore>) {
        self.autosave = Some(Autosaver::spawn(self.page_id.clone(), store, &self.config));
    }

    pub fn persistence_events(&self) -> Option<broadcast::Receiver<PersistenceEvent>> {
        self.autosave.as_ref().map(Autosaver::subscribe)
    }

    /// Tear the session down, flushing any pending save.
    pub async fn close(mut self) {
        self.drag.cancel();
        if let Some(autosave) = self.autosave.take() {
            autosave.close().await;
        }
        info!(session = %self.id, page_id = %self.page_id, "Session closed");
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn commit<C>(&mut self, label: String, result: MutationResult<C>) -> C {
        self.history.record(label, &result);
        self.document = result.document;
        self.document_changed();
        result.created
    }

    fn document_changed(&self) {
        if let Some(autosave) = &self.autosave {
            autosave.notify(&self.document);
        }
    }

    // Mutation API

    pub fn insert(
        &mut self,
        parent: Option<&NodeId>,
        zone: Option<&str>,
        index: usize,
        component_type: &str,
        props: Props,
    ) -> Result<NodeId, MutationError> {
        let result = self
            .engine
            .insert(&self.document, parent, zone, index, component_type, props)?;
        Ok(self.commit(format!("Insert {component_type}"), result))
    }

    pub fn insert_subtree(
        &mut self,
        parent: Option<&NodeId>,
        zone: Option<&str>,
        index: usize,
        template: &NodeTemplate,
    ) -> Result<NodeId, MutationError> {
        let result = self
            .engine
            .insert_subtree(&self.document, parent, zone, index, template)?;
        let label = format!("Insert {}", template.component_type);
        Ok(self.commit(label, result))
    }

    pub fn move_node(
        &mut self,
        node: &NodeId,
        parent: Option<&NodeId>,
        zone: Option<&str>,
        index: usize,
    ) -> Result<(), MutationError> {
        let result = self
            .engine
            .move_node(&self.document, node, parent, zone, index)?;
        self.commit(format!("Move {node}"), result);
        Ok(())
    }

    pub fn delete(&mut self, node: &NodeId) -> Result<(), MutationError> {
        let result = self.engine.delete(&self.document, node)?;
        self.commit(format!("Delete {node}"), result);
        Ok(())
    }

    pub fn duplicate(&mut self, node: &NodeId) -> Result<NodeId, MutationError> {
        let result = self.engine.duplicate(&self.document, node)?;
        Ok(self.commit(format!("Duplicate {node}"), result))
    }

    pub fn set_props(&mut self, node: &NodeId, patch: &Props) -> Result<(), MutationError> {
        let result = self.engine.set_props(&self.document, node, patch)?;
        self.commit(format!("Edit {node}"), result);
        Ok(())
    }

    pub fn set_locked(&mut self, node: &NodeId, locked: bool) -> Result<(), MutationError> {
        let result = self.engine.set_locked(&self.document, node, locked)?;
        let verb = if locked { "Lock" } else { "Unlock" };
        self.commit(format!("{verb} {node}"), result);
        Ok(())
    }

    pub fn set_hidden(&mut self, node: &NodeId, hidden: bool) -> Result<(), MutationError> {
        let result = self.engine.set_hidden(&self.document, node, hidden)?;
        let verb = if hidden { "Hide" } else { "Show" };
        self.commit(format!("{verb} {node}"), result);
        Ok(())
    }

    // History

    pub fn begin_batch(&mut self, label: impl Into<String>) {
        self.history.begin_batch(label);
    }

    pub fn end_batch(&mut self) -> bool {
        self.history.end_batch()
    }

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.document) {
            Some((document, _)) => {
                self.document = document;
                self.document_changed();
                true
            }
            None => false,
        }
    }

    /// Refused while a batch is open, since the batch would be recorded on
    /// top of the redone entry.
    pub fn redo(&mut self) -> bool {
        if self.history.is_batching() {
            debug!(page_id = %self.page_id, "Redo ignored while a batch is open");
            return false;
        }
        match self.history.redo(&self.document) {
            Some((document, _)) => {
                self.document = document;
                self.document_changed();
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&mut self, label: impl Into<String>) -> SnapshotId {
        self.history.snapshot(label, &self.document)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        self.history.snapshots()
    }

    /// Restore a snapshot as one undoable entry.
    pub fn restore_snapshot(&mut self, id: SnapshotId) -> Result<(), EditorError> {
        let snapshot = self
            .history
            .get_snapshot(id)
            .ok_or(EditorError::SnapshotNotFound(id))?;
        let label = format!("Restore '{}'", snapshot.label);
        let target = snapshot.document.clone();

        let result = self.engine.replace_document(&self.document, target);
        self.commit(label, result);
        Ok(())
    }

    pub fn delete_snapshot(&mut self, id: SnapshotId) -> Result<(), EditorError> {
        if self.history.delete_snapshot(id) {
            Ok(())
        } else {
            Err(EditorError::SnapshotNotFound(id))
        }
    }

    // Projection

    pub fn ui_state(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_state_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    pub fn project(&mut self, mode: ProjectionMode) -> RenderTree {
        self.projector.project(&self.document, &self.ui, mode)
    }

    // Drag and drop

    pub fn begin_drag(&mut self, source: DragSource, pointer: Point) {
        self.drag.begin(source, pointer);
    }

    /// Preview a pointer position; never mutates the document.
    pub fn drag_over(&mut self, layout: &LayoutHints, pointer: Point) -> Option<DropIndicator> {
        let tree = self.drop_projector.project(
            &self.document,
            &UiState::default(),
            ProjectionMode::Canvas,
        );
        self.drag
            .pointer_moved(&self.document, &self.registry, &tree, layout, pointer)
            .cloned()
    }

    /// Release the pointer, issuing at most one mutation.
    pub fn drop_drag(&mut self) -> DragOutcome {
        match self.drag.drop(&self.document) {
            DropIntent::NoOp => DragOutcome::Unchanged,
            DropIntent::Cancel { reason } => DragOutcome::Cancelled { reason },
            DropIntent::Move {
                node,
                parent,
                zone,
                index,
            } => match self.move_node(&node, parent.as_ref(), zone.as_deref(), index) {
                Ok(()) => DragOutcome::Committed(None),
                Err(e) => DragOutcome::Cancelled { reason: Some(e) },
            },
            DropIntent::Insert {
                component_type,
                props,
                target,
            } => match self.insert(
                target.parent.as_ref(),
                target.zone.as_deref(),
                target.index,
                &component_type,
                props,
            ) {
                Ok(id) => DragOutcome::Committed(Some(id)),
                Err(e) => DragOutcome::Cancelled { reason: Some(e) },
            },
        }
    }

    pub fn cancel_drag(&mut self) -> DragOutcome {
        self.drag.cancel()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }
}
