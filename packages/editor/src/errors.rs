//! Error types for the editor

use crate::history::SnapshotId;
use crate::mutations::MutationError;
use crate::storage::StorageError;
use pagecraft_document::InvariantViolation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(SnapshotId),

    #[error("Document violates {} invariant(s); first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    InvalidDocument(Vec<InvariantViolation>),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
