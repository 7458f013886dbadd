//! # Undo/Redo History
//!
//! Linear history of forward/inverse mutation pairs with a cursor.
//!
//! ## Design
//!
//! - Entries hold committed mutations, not whole documents
//! - Recording truncates the redo tail
//! - The oldest entries are evicted past the configured limit
//! - Batches group several engine results into one entry
//! - Snapshots are full documents, restored through a recorded entry
//!
//! Inverses are built by the engine against the document they undo, so
//! applying one can only fail if the history and document have drifted
//! apart. That is an engine bug and is treated as fatal.

use crate::mutations::MutationResult;
use chrono::{DateTime, Utc};
use pagecraft_document::{Document, Mutation};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, error, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(u64);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snapshot-{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub label: String,
    pub forward: Mutation,
    pub inverse: Mutation,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub label: String,
    pub document: Document,

    /// History cursor when the snapshot was taken
    pub cursor: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    /// Cursor at a stable position, nothing pending
    Clean,
    /// Inside `record`
    Committing,
    /// Between `begin_batch` and the matching `end_batch`
    Batching,
}

#[derive(Debug)]
struct PendingBatch {
    label: String,
    depth: usize,
    forward: Vec<Mutation>,
    inverse: Vec<Mutation>,
}

#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    /// Number of applied entries; `entries[cursor - 1]` is the next undo
    cursor: usize,
    limit: usize,
    state: HistoryState,
    batch: Option<PendingBatch>,
    snapshots: Vec<Snapshot>,
    next_snapshot: u64,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            limit: limit.max(1),
            state: HistoryState::Clean,
            batch: None,
            snapshots: Vec::new(),
            next_snapshot: 1,
        }
    }

    pub fn state(&self) -> HistoryState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a successful engine result
    pub fn record<C>(&mut self, label: impl Into<String>, result: &MutationResult<C>) {
        if let Some(batch) = self.batch.as_mut() {
            batch.forward.push(result.forward.clone());
            batch.inverse.push(result.inverse.clone());
            return;
        }

        self.push_entry(label.into(), result.forward.clone(), result.inverse.clone());
    }

    fn push_entry(&mut self, label: String, forward: Mutation, inverse: Mutation) {
        self.state = HistoryState::Committing;

        self.entries.truncate(self.cursor);
        debug!(label = %label, op = forward.name(), cursor = self.cursor, "Recording history entry");
        self.entries.push_back(HistoryEntry {
            label,
            forward,
            inverse,
            timestamp: Utc::now(),
        });
        self.cursor += 1;

        while self.entries.len() > self.limit {
            self.entries.pop_front();
            self.cursor -= 1;
            for snapshot in &mut self.snapshots {
                snapshot.cursor = snapshot.cursor.saturating_sub(1);
            }
        }

        self.state = HistoryState::Clean;
    }

    /// Start grouping recorded results into one entry; batches nest.
    pub fn begin_batch(&mut self, label: impl Into<String>) {
        match self.batch.as_mut() {
            Some(batch) => batch.depth += 1,
            None => {
                self.batch = Some(PendingBatch {
                    label: label.into(),
                    depth: 1,
                    forward: Vec::new(),
                    inverse: Vec::new(),
                });
                self.state = HistoryState::Batching;
            }
        }
    }

    /// Close one batch level. Returns true when an entry was recorded.
    pub fn end_batch(&mut self) -> bool {
        let Some(batch) = self.batch.as_mut() else {
            return false;
        };
        batch.depth -= 1;
        if batch.depth > 0 {
            return false;
        }
        self.flush_batch()
    }

    fn flush_batch(&mut self) -> bool {
        let Some(batch) = self.batch.take() else {
            return false;
        };
        self.state = HistoryState::Clean;
        if batch.forward.is_empty() {
            return false;
        }

        let mut inverse = batch.inverse;
        inverse.reverse();
        self.push_entry(batch.label, Mutation::batch(batch.forward), Mutation::batch(inverse));
        true
    }

    /// True between the outermost `begin_batch` and its `end_batch`
    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0 || self.batch.as_ref().is_some_and(|b| !b.forward.is_empty())
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|entry| entry.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(|entry| entry.label.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Step back one entry. An open batch is closed first.
    ///
    /// Returns the restored document and the undone entry's label.
    #[instrument(skip(self, doc))]
    pub fn undo(&mut self, doc: &Document) -> Option<(Document, String)> {
        self.flush_batch();
        if self.cursor == 0 {
            return None;
        }

        let entry = &self.entries[self.cursor - 1];
        let next = apply_or_die(doc, &entry.inverse, &entry.label, "undo");
        let label = entry.label.clone();
        self.cursor -= 1;
        debug!(label = %label, cursor = self.cursor, "Undo");
        Some((next, label))
    }

    /// Re-apply the entry after the cursor
    #[instrument(skip(self, doc))]
    pub fn redo(&mut self, doc: &Document) -> Option<(Document, String)> {
        if self.is_batching() {
            return None;
        }
        let entry = self.entries.get(self.cursor)?;
        let next = apply_or_die(doc, &entry.forward, &entry.label, "redo");
        let label = entry.label.clone();
        self.cursor += 1;
        debug!(label = %label, cursor = self.cursor, "Redo");
        Some((next, label))
    }

    pub fn snapshot(&mut self, label: impl Into<String>, doc: &Document) -> SnapshotId {
        let id = SnapshotId(self.next_snapshot);
        self.next_snapshot += 1;
        let label = label.into();
        debug!(snapshot = %id, label = %label, "Snapshot taken");
        self.snapshots.push(Snapshot {
            id,
            label,
            document: doc.clone(),
            cursor: self.cursor,
            created_at: Utc::now(),
        });
        id
    }

    pub fn get_snapshot(&self, id: SnapshotId) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn delete_snapshot(&mut self, id: SnapshotId) -> bool {
        let before = self.snapshots.len();
        self.snapshots.retain(|s| s.id != id);
        before != self.snapshots.len()
    }
}

fn apply_or_die(doc: &Document, mutation: &Mutation, label: &str, direction: &str) -> Document {
    match doc.apply_committed(mutation) {
        Ok(next) => next,
        Err(err) => {
            error!(label = %label, op = mutation.name(), error = %err, "History is out of sync with the document");
            panic!("history corrupted during {direction} of '{label}': {err}");
        }
    }
}
