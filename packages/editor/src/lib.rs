//! # Pagecraft Editor
//!
//! Interactive editing engine for page documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ drag: pointer gesture → preview → one drop  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ mutations: validate against schema + locks  │
//! │  - insert / move / delete / duplicate       │
//! │  - setProps / setLocked / setHidden         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ history: forward/inverse entries, snapshots │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: new immutable Document value      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ projection: visible render tree for the UI  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! All of it is owned by an [`EditSession`]. Persistence happens off the
//! interaction path through the debounced [`Autosaver`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{EditSession, EditorConfig};
//! use pagecraft_schema::standard_registry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(standard_registry());
//! let mut session = EditSession::new("home", Document::new(), registry, EditorConfig::default())?;
//!
//! let section = session.insert(None, None, 0, "Section", Props::new())?;
//! session.insert(Some(&section), Some("body"), 0, "Heading", Props::new())?;
//! session.undo();
//! ```

mod autosave;
mod config;
mod drag;
mod errors;
mod history;
mod hit;
mod mutations;
mod projection;
mod rules;
mod session;
mod storage;

pub use autosave::{Autosaver, PersistenceEvent};
pub use config::EditorConfig;
pub use drag::{DragCoordinator, DragOutcome, DragSource, DragState, DropIndicator, DropIntent};
pub use errors::EditorError;
pub use history::{History, HistoryEntry, HistoryState, Snapshot, SnapshotId};
pub use hit::{hit_test, resolve_drop_target, DropTarget, LayoutHints, Point, Rect};
pub use mutations::{MutationEngine, MutationError, MutationResult, NodeTemplate};
pub use projection::{project, ProjectionMode, Projector, RenderNode, RenderTree, UiState};
pub use rules::{check_insert, check_move};
pub use session::EditSession;
pub use storage::{DocumentStore, FileStore, MemoryStore, StorageError};

// Re-export common types for convenience
pub use pagecraft_document::{Document, Mutation, Node, NodeId};
pub use pagecraft_schema::{PropValue, Props, SchemaRegistry};
