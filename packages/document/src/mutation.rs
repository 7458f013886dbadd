//! # Committed Mutations
//!
//! Low-level, already validated tree changes.
//!
//! The mutation engine turns user intent (insert, move, delete, ...) into
//! one of these after checking schema, lock and zone rules, and records an
//! inverse built from the same vocabulary. Applying a committed mutation
//! only checks structural sanity (ids exist, positions fit, no cycles);
//! every policy decision has already been made.
//!
//! Positions are absolute indices into the parent's `children` list (or
//! the root list when `parent` is `None`).

use crate::document::{Document, Node};
use crate::id::NodeId;
use pagecraft_schema::Props;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    /// Attach a subtree. `nodes[0]` is the subtree root; the rest are its
    /// descendants, already linked to each other.
    #[serde(rename_all = "camelCase")]
    InsertSubtree {
        parent: Option<NodeId>,
        zone: Option<String>,
        position: usize,
        nodes: Vec<Node>,
    },

    /// Detach a node and drop it together with its descendants
    RemoveSubtree { node: NodeId },

    /// Move a node; `position` is read after the node has been detached
    Relocate {
        node: NodeId,
        parent: Option<NodeId>,
        zone: Option<String>,
        position: usize,
    },

    /// Replace the full prop bag of a node
    ReplaceProps { node: NodeId, props: Props },

    SetLocked { node: NodeId, locked: bool },

    SetHidden { node: NodeId, hidden: bool },

    /// Swap in a whole document (snapshot restore)
    ReplaceDocument { document: Box<Document> },

    /// Several mutations applied in order as one step
    Batch { mutations: Vec<Mutation> },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApplyError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node id already in use: {0}")]
    DuplicateId(NodeId),

    #[error("Position {position} out of range for {len} children")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Moving {node} under {parent} would create a cycle")]
    CycleDetected { node: NodeId, parent: NodeId },

    #[error("Empty subtree")]
    EmptySubtree,
}

impl Mutation {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertSubtree { .. } => "insert_subtree",
            Mutation::RemoveSubtree { .. } => "remove_subtree",
            Mutation::Relocate { .. } => "relocate",
            Mutation::ReplaceProps { .. } => "replace_props",
            Mutation::SetLocked { .. } => "set_locked",
            Mutation::SetHidden { .. } => "set_hidden",
            Mutation::ReplaceDocument { .. } => "replace_document",
            Mutation::Batch { .. } => "batch",
        }
    }

    /// Combine mutations into one; a single mutation is returned unchanged.
    pub fn batch(mut mutations: Vec<Mutation>) -> Mutation {
        if mutations.len() == 1 {
            mutations.remove(0)
        } else {
            Mutation::Batch { mutations }
        }
    }
}

impl Document {
    /// Apply a committed mutation, returning the resulting document.
    ///
    /// `self` is left untouched whether or not the call succeeds.
    pub fn apply_committed(&self, mutation: &Mutation) -> Result<Document, ApplyError> {
        let mut next = self.clone();
        next.apply_in_place(mutation)?;
        Ok(next)
    }

    fn apply_in_place(&mut self, mutation: &Mutation) -> Result<(), ApplyError> {
        match mutation {
            Mutation::InsertSubtree {
                parent,
                zone,
                position,
                nodes,
            } => self.insert_subtree(parent.as_ref(), zone.as_ref(), *position, nodes),

            Mutation::RemoveSubtree { node } => self.remove_subtree(node),

            Mutation::Relocate {
                node,
                parent,
                zone,
                position,
            } => self.relocate(node, parent.as_ref(), zone.as_ref(), *position),

            Mutation::ReplaceProps { node, props } => {
                let target = self
                    .node_mut(node)
                    .ok_or_else(|| ApplyError::NodeNotFound(node.clone()))?;
                target.props = props.clone();
                Ok(())
            }

            Mutation::SetLocked { node, locked } => {
                let target = self
                    .node_mut(node)
                    .ok_or_else(|| ApplyError::NodeNotFound(node.clone()))?;
                target.locked = *locked;
                Ok(())
            }

            Mutation::SetHidden { node, hidden } => {
                let target = self
                    .node_mut(node)
                    .ok_or_else(|| ApplyError::NodeNotFound(node.clone()))?;
                target.hidden = *hidden;
                Ok(())
            }

            Mutation::ReplaceDocument { document } => {
                *self = document.as_ref().clone();
                Ok(())
            }

            Mutation::Batch { mutations } => {
                for mutation in mutations {
                    self.apply_in_place(mutation)?;
                }
                Ok(())
            }
        }
    }

    fn insert_subtree(
        &mut self,
        parent: Option<&NodeId>,
        zone: Option<&String>,
        position: usize,
        nodes: &[Node],
    ) -> Result<(), ApplyError> {
        let root = nodes.first().ok_or(ApplyError::EmptySubtree)?;
        for node in nodes {
            if self.contains(&node.id) {
                return Err(ApplyError::DuplicateId(node.id.clone()));
            }
        }

        let siblings = self
            .children_mut(parent)
            .ok_or_else(|| ApplyError::NodeNotFound(parent.cloned().unwrap_or_else(|| root.id.clone())))?;
        if position > siblings.len() {
            return Err(ApplyError::PositionOutOfRange {
                position,
                len: siblings.len(),
            });
        }
        siblings.insert(position, root.id.clone());

        let mut root = root.clone();
        root.parent_id = parent.cloned();
        root.zone_id = zone.cloned();
        self.insert_node(root);
        for node in &nodes[1..] {
            self.insert_node(node.clone());
        }
        Ok(())
    }

    fn remove_subtree(&mut self, id: &NodeId) -> Result<(), ApplyError> {
        let doomed: Vec<NodeId> = self.subtree(id).iter().map(|n| n.id.clone()).collect();
        if doomed.is_empty() {
            return Err(ApplyError::NodeNotFound(id.clone()));
        }

        self.detach(id)?;
        for node in &doomed {
            self.remove_node(node);
        }
        Ok(())
    }

    fn relocate(
        &mut self,
        id: &NodeId,
        parent: Option<&NodeId>,
        zone: Option<&String>,
        position: usize,
    ) -> Result<(), ApplyError> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(ApplyError::NodeNotFound(parent.clone()));
            }
            if self.is_within(parent, id) {
                return Err(ApplyError::CycleDetected {
                    node: id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        self.detach(id)?;

        let siblings = self
            .children_mut(parent)
            .ok_or_else(|| ApplyError::NodeNotFound(id.clone()))?;
        if position > siblings.len() {
            return Err(ApplyError::PositionOutOfRange {
                position,
                len: siblings.len(),
            });
        }
        siblings.insert(position, id.clone());

        let node = self
            .node_mut(id)
            .ok_or_else(|| ApplyError::NodeNotFound(id.clone()))?;
        node.parent_id = parent.cloned();
        node.zone_id = zone.cloned();
        Ok(())
    }

    /// Remove a node's id from its parent's children list
    fn detach(&mut self, id: &NodeId) -> Result<(), ApplyError> {
        let parent = self
            .node(id)
            .ok_or_else(|| ApplyError::NodeNotFound(id.clone()))?
            .parent_id
            .clone();
        let siblings = self
            .children_mut(parent.as_ref())
            .ok_or_else(|| ApplyError::NodeNotFound(parent.clone().unwrap_or_else(|| id.clone())))?;
        let index = siblings
            .iter()
            .position(|child| child == id)
            .ok_or_else(|| ApplyError::NodeNotFound(id.clone()))?;
        siblings.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn node(id: &str, component_type: &str) -> Node {
        Node::new(NodeId::from(id), component_type)
    }

    fn insert(parent: Option<&str>, position: usize, nodes: Vec<Node>) -> Mutation {
        Mutation::InsertSubtree {
            parent: parent.map(NodeId::from),
            zone: parent.map(|_| "content".to_string()),
            position,
            nodes,
        }
    }

    #[test]
    fn test_insert_and_remove_subtree() {
        let doc = Document::new();
        let doc = doc
            .apply_committed(&insert(None, 0, vec![node("a", "Container")]))
            .unwrap();
        let mut child = node("b", "Text");
        child.parent_id = Some(NodeId::from("a"));
        let doc = doc
            .apply_committed(&insert(Some("a"), 0, vec![child]))
            .unwrap();

        assert_eq!(doc.len(), 2);
        assert_eq!(doc.node(&NodeId::from("a")).unwrap().children, vec![NodeId::from("b")]);
        assert_eq!(doc.node(&NodeId::from("b")).unwrap().zone_id.as_deref(), Some("content"));

        let doc = doc
            .apply_committed(&Mutation::RemoveSubtree { node: NodeId::from("a") })
            .unwrap();
        assert!(doc.is_empty());
        assert!(doc.root_children().is_empty());
    }

    #[test]
    fn test_failed_apply_leaves_original() {
        let doc = Document::new()
            .apply_committed(&insert(None, 0, vec![node("a", "Container")]))
            .unwrap();

        let err = doc
            .apply_committed(&insert(None, 5, vec![node("b", "Container")]))
            .unwrap_err();
        assert_eq!(err, ApplyError::PositionOutOfRange { position: 5, len: 1 });

        let err = doc
            .apply_committed(&insert(None, 0, vec![node("a", "Container")]))
            .unwrap_err();
        assert_eq!(err, ApplyError::DuplicateId(NodeId::from("a")));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_relocate_rejects_cycles() {
        let doc = Document::new()
            .apply_committed(&insert(None, 0, vec![node("a", "Container")]))
            .unwrap();
        let mut b = node("b", "Container");
        b.parent_id = Some(NodeId::from("a"));
        let doc = doc.apply_committed(&insert(Some("a"), 0, vec![b])).unwrap();

        let err = doc
            .apply_committed(&Mutation::Relocate {
                node: NodeId::from("a"),
                parent: Some(NodeId::from("b")),
                zone: Some("content".into()),
                position: 0,
            })
            .unwrap_err();
        assert!(matches!(err, ApplyError::CycleDetected { .. }));
    }

    #[test]
    fn test_relocate_within_same_parent() {
        let doc = Document::new()
            .apply_committed(&Mutation::Batch {
                mutations: vec![
                    insert(None, 0, vec![node("a", "Container")]),
                    insert(None, 1, vec![node("b", "Container")]),
                    insert(None, 2, vec![node("c", "Container")]),
                ],
            })
            .unwrap();

        let doc = doc
            .apply_committed(&Mutation::Relocate {
                node: NodeId::from("a"),
                parent: None,
                zone: None,
                position: 2,
            })
            .unwrap();

        let order: Vec<_> = doc.root_children().iter().map(|id| id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_untouched_nodes_are_shared() {
        let doc = Document::new()
            .apply_committed(&Mutation::Batch {
                mutations: vec![
                    insert(None, 0, vec![node("a", "Container")]),
                    insert(None, 1, vec![node("b", "Container")]),
                ],
            })
            .unwrap();

        let mut props = Props::new();
        props.insert("label".into(), json!("Hero"));
        let next = doc
            .apply_committed(&Mutation::ReplaceProps {
                node: NodeId::from("a"),
                props,
            })
            .unwrap();

        let b = NodeId::from("b");
        let a = NodeId::from("a");
        assert!(Arc::ptr_eq(doc.node_arc(&b).unwrap(), next.node_arc(&b).unwrap()));
        assert!(!Arc::ptr_eq(doc.node_arc(&a).unwrap(), next.node_arc(&a).unwrap()));
        assert_eq!(doc.node(&a).unwrap().prop_str("label"), None);
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::SetHidden {
            node: NodeId::from("a"),
            hidden: true,
        };
        let json = serde_json::to_string(&mutation).unwrap();
        assert!(json.contains("\"op\":\"setHidden\""));
        let back: Mutation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mutation);
    }
}
