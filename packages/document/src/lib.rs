//! # Pagecraft Document
//!
//! The canonical page tree.
//!
//! A [`Document`] is an immutable value: nodes keyed by [`NodeId`] plus the
//! ordered list of root children. The only way to change one is
//! [`Document::apply_committed`], which takes an already validated
//! [`Mutation`] and returns a *new* document. Unchanged nodes are shared
//! between the old and new value through `Arc`, so readers holding an older
//! document never observe a half-applied change.
//!
//! ```text
//! mutation engine ──(validated Mutation)──▶ apply_committed ──▶ new Document
//! ```

mod document;
mod id;
mod invariants;
mod mutation;
mod visitor;

pub use document::{Document, Node};
pub use id::{get_document_id, IdGenerator, NodeId};
pub use invariants::{check_invariants, InvariantViolation};
pub use mutation::{ApplyError, Mutation};
pub use visitor::{walk_document, walk_node, Visitor};

pub use pagecraft_schema::{PropValue, Props};
