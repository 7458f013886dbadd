//! # Mutation Engine
//!
//! User-level edit operations on a [`Document`].
//!
//! Each operation validates against the schema registry, zone rules and
//! lock flags, then produces a committed forward [`Mutation`] together with
//! its inverse. The input document is never touched: on success the caller
//! receives a new document value, on failure nothing has changed.
//!
//! ## Semantics
//!
//! ### Insert
//! - Zone defaults to the parent schema's default zone
//! - Missing props are filled from schema defaults
//! - Index is zone-relative and clamped to the zone length
//!
//! ### Move
//! - Index is read after the node has been detached
//! - Fails if the destination is the node itself or inside it
//! - Fails if the node or the destination parent is locked
//!
//! ### Delete
//! - Removes the node and all descendants
//! - Fails if anything in the subtree is locked
//!
//! ### Duplicate
//! - Deep copy with fresh ids, inserted right after the source

use crate::rules::{self, check_insert, check_move};
use pagecraft_document::{check_invariants, ApplyError, Document, IdGenerator, Mutation, Node, NodeId};
use pagecraft_schema::{Props, PropValue, Schema, SchemaRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Unknown component type: {0}")]
    UnknownComponentType(String),

    #[error("Zone '{zone}' does not accept '{component_type}'")]
    ZoneRejected { zone: String, component_type: String },

    #[error("Parent is locked: {0}")]
    ParentLocked(NodeId),

    #[error("Node is locked: {0}")]
    NodeLocked(NodeId),

    #[error("Cannot move {node} into {destination}: it would become its own ancestor")]
    CycleDetected { node: NodeId, destination: NodeId },

    #[error("Index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid value for prop '{prop}': {reason}")]
    InvalidPropValue { prop: String, reason: String },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Tree store rejected mutation: {0}")]
    Apply(ApplyError),
}

impl MutationError {
    /// Fill in the component type on a zone rejection raised before the
    /// moving/inserted type was known.
    pub(crate) fn for_type(self, component_type: &str) -> Self {
        match self {
            MutationError::ZoneRejected {
                zone,
                component_type: current,
            } if current.is_empty() => MutationError::ZoneRejected {
                zone,
                component_type: component_type.to_string(),
            },
            other => other,
        }
    }
}

impl From<ApplyError> for MutationError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::NodeNotFound(id) => MutationError::NodeNotFound(id),
            ApplyError::PositionOutOfRange { position, len } => {
                MutationError::IndexOutOfRange { index: position, len }
            }
            ApplyError::CycleDetected { node, parent } => MutationError::CycleDetected {
                node,
                destination: parent,
            },
            other => MutationError::Apply(other),
        }
    }
}

/// Outcome of a successful engine operation.
///
/// `created` is the root id of the new subtree for insert and duplicate,
/// and `()` for every other operation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult<C = ()> {
    pub document: Document,
    pub forward: Mutation,
    pub inverse: Mutation,
    pub created: C,
}

impl<C> MutationResult<C> {
    /// Drop the created id, for code that treats all operations alike
    pub fn into_untyped(self) -> MutationResult {
        MutationResult {
            document: self.document,
            forward: self.forward,
            inverse: self.inverse,
            created: (),
        }
    }
}

/// A subtree to insert; ids are assigned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    #[serde(rename = "type")]
    pub component_type: String,

    #[serde(default)]
    pub props: Props,

    /// Zone within the template parent; ignored on the template root
    #[serde(default)]
    pub zone: Option<String>,

    #[serde(default)]
    pub children: Vec<NodeTemplate>,
}

impl NodeTemplate {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            props: Props::new(),
            zone: None,
            children: Vec::new(),
        }
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn child(mut self, child: NodeTemplate) -> Self {
        self.children.push(child);
        self
    }
}

pub struct MutationEngine {
    registry: Arc<SchemaRegistry>,
    ids: IdGenerator,
}

impl MutationEngine {
    pub fn new(registry: Arc<SchemaRegistry>, ids: IdGenerator) -> Self {
        Self { registry, ids }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Insert a single new node
    pub fn insert(
        &mut self,
        doc: &Document,
        parent: Option<&NodeId>,
        zone: Option<&str>,
        index: usize,
        component_type: &str,
        props: Props,
    ) -> Result<MutationResult<NodeId>, MutationError> {
        let template = NodeTemplate::new(component_type).with_props(props);
        self.insert_subtree(doc, parent, zone, index, &template)
    }

    /// Insert a whole template subtree, validating every node of it.
    pub fn insert_subtree(
        &mut self,
        doc: &Document,
        parent: Option<&NodeId>,
        zone: Option<&str>,
        index: usize,
        template: &NodeTemplate,
    ) -> Result<MutationResult<NodeId>, MutationError> {
        let zone = check_insert(doc, &self.registry, parent, zone, &template.component_type)?;

        // Validate before allocating so failures don't burn ids
        self.validate_template(template)?;

        let mut nodes = Vec::new();
        let root = self.build_subtree(template, parent.cloned(), zone.clone(), &mut nodes)?;

        let siblings = doc
            .children_of(parent)
            .ok_or_else(|| MutationError::NodeNotFound(parent.cloned().unwrap_or_else(|| root.clone())))?;
        let position = rules::zone_position(doc, siblings, zone.as_deref(), index);

        let forward = Mutation::InsertSubtree {
            parent: parent.cloned(),
            zone,
            position,
            nodes,
        };
        let inverse = Mutation::RemoveSubtree { node: root.clone() };
        self.commit(doc, forward, inverse, root)
    }

    /// Move a node to a new parent/zone/index
    pub fn move_node(
        &mut self,
        doc: &Document,
        node: &NodeId,
        parent: Option<&NodeId>,
        zone: Option<&str>,
        index: usize,
    ) -> Result<MutationResult, MutationError> {
        let zone = check_move(doc, &self.registry, node, parent, zone)?;

        let source = doc
            .node(node)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?;
        let old_position = doc
            .index_in_parent(node)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?;

        let siblings: Vec<NodeId> = doc
            .children_of(parent)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?
            .iter()
            .filter(|id| *id != node)
            .cloned()
            .collect();
        let position = rules::zone_position(doc, &siblings, zone.as_deref(), index);

        let forward = Mutation::Relocate {
            node: node.clone(),
            parent: parent.cloned(),
            zone,
            position,
        };
        let inverse = Mutation::Relocate {
            node: node.clone(),
            parent: source.parent_id.clone(),
            zone: source.zone_id.clone(),
            position: old_position,
        };
        self.commit(doc, forward, inverse, ())
    }

    /// Remove a node and its whole subtree
    pub fn delete(&mut self, doc: &Document, node: &NodeId) -> Result<MutationResult, MutationError> {
        let target = doc
            .node(node)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?;
        if let Some(locked) = rules::locked_in_subtree(doc, node) {
            return Err(MutationError::NodeLocked(locked));
        }

        let position = doc
            .index_in_parent(node)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?;
        let nodes: Vec<Node> = doc.subtree(node).into_iter().cloned().collect();

        let forward = Mutation::RemoveSubtree { node: node.clone() };
        let inverse = Mutation::InsertSubtree {
            parent: target.parent_id.clone(),
            zone: target.zone_id.clone(),
            position,
            nodes,
        };
        self.commit(doc, forward, inverse, ())
    }

    /// Deep-copy a subtree with fresh ids, right after the source
    pub fn duplicate(
        &mut self,
        doc: &Document,
        node: &NodeId,
    ) -> Result<MutationResult<NodeId>, MutationError> {
        let source = doc
            .node(node)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?;
        if let Some(parent) = &source.parent_id {
            if doc.node(parent).is_some_and(|p| p.locked) {
                return Err(MutationError::NodeLocked(parent.clone()));
            }
        }

        let originals = doc.subtree(node);
        let mapping: std::collections::HashMap<&NodeId, NodeId> = originals
            .iter()
            .map(|original| (&original.id, self.ids.new_id()))
            .collect();

        let mut nodes = Vec::with_capacity(originals.len());
        for original in &originals {
            let mut copy = (*original).clone();
            copy.id = mapping[&original.id].clone();
            copy.children = original.children.iter().map(|c| mapping[c].clone()).collect();
            copy.parent_id = original
                .parent_id
                .as_ref()
                .map(|p| mapping.get(p).cloned().unwrap_or_else(|| p.clone()));
            nodes.push(copy);
        }

        let root = mapping[node].clone();
        let position = doc
            .index_in_parent(node)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?
            + 1;

        let forward = Mutation::InsertSubtree {
            parent: source.parent_id.clone(),
            zone: source.zone_id.clone(),
            position,
            nodes,
        };
        let inverse = Mutation::RemoveSubtree { node: root.clone() };
        self.commit(doc, forward, inverse, root)
    }

    /// Merge a prop patch; `null` values revert a prop to its default.
    pub fn set_props(
        &mut self,
        doc: &Document,
        node: &NodeId,
        patch: &Props,
    ) -> Result<MutationResult, MutationError> {
        let target = doc
            .node(node)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?;
        if target.locked {
            return Err(MutationError::NodeLocked(node.clone()));
        }
        let schema = rules::schema_of(&self.registry, &target.component_type)?;

        let mut props = target.props.clone();
        for (name, value) in patch {
            let spec = schema.props.get(name).ok_or_else(|| MutationError::InvalidPropValue {
                prop: name.clone(),
                reason: format!("'{}' has no prop named '{}'", target.component_type, name),
            })?;

            if value.is_null() {
                if spec.has_default() {
                    props.insert(name.clone(), spec.default.clone());
                } else {
                    props.remove(name);
                }
                continue;
            }

            spec.kind
                .check(value)
                .map_err(|reason| MutationError::InvalidPropValue {
                    prop: name.clone(),
                    reason,
                })?;
            props.insert(name.clone(), value.clone());
        }

        let forward = Mutation::ReplaceProps {
            node: node.clone(),
            props,
        };
        let inverse = Mutation::ReplaceProps {
            node: node.clone(),
            props: target.props.clone(),
        };
        self.commit(doc, forward, inverse, ())
    }

    /// Exempt from the lock check on the node itself
    pub fn set_locked(
        &mut self,
        doc: &Document,
        node: &NodeId,
        locked: bool,
    ) -> Result<MutationResult, MutationError> {
        let target = doc
            .node(node)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?;
        let forward = Mutation::SetLocked {
            node: node.clone(),
            locked,
        };
        let inverse = Mutation::SetLocked {
            node: node.clone(),
            locked: target.locked,
        };
        self.commit(doc, forward, inverse, ())
    }

    /// Exempt from the lock check on the node itself
    pub fn set_hidden(
        &mut self,
        doc: &Document,
        node: &NodeId,
        hidden: bool,
    ) -> Result<MutationResult, MutationError> {
        let target = doc
            .node(node)
            .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?;
        let forward = Mutation::SetHidden {
            node: node.clone(),
            hidden,
        };
        let inverse = Mutation::SetHidden {
            node: node.clone(),
            hidden: target.hidden,
        };
        self.commit(doc, forward, inverse, ())
    }

    /// Swap the whole document; used for snapshot restore.
    pub fn replace_document(&mut self, doc: &Document, next: Document) -> MutationResult {
        self.ids.reserve(next.node_ids());
        MutationResult {
            forward: Mutation::ReplaceDocument {
                document: Box::new(next.clone()),
            },
            inverse: Mutation::ReplaceDocument {
                document: Box::new(doc.clone()),
            },
            document: next,
            created: (),
        }
    }

    fn commit<C>(
        &self,
        doc: &Document,
        forward: Mutation,
        inverse: Mutation,
        created: C,
    ) -> Result<MutationResult<C>, MutationError> {
        let document = doc.apply_committed(&forward)?;
        debug!(op = forward.name(), nodes = document.len(), "Committed mutation");

        if cfg!(debug_assertions) {
            let violations = check_invariants(&document, &self.registry);
            debug_assert!(violations.is_empty(), "invariants broken after {}: {:?}", forward.name(), violations);
        }

        Ok(MutationResult {
            document,
            forward,
            inverse,
            created,
        })
    }

    fn validate_template(&self, template: &NodeTemplate) -> Result<(), MutationError> {
        let schema = rules::schema_of(&self.registry, &template.component_type)?;
        validate_props(schema, &template.component_type, &template.props)?;

        for child in &template.children {
            rules::schema_of(&self.registry, &child.component_type)?;
            let zone = child_zone(schema, child)?;
            let accepted = schema
                .zone_spec(&zone)
                .is_some_and(|spec| spec.accepts(&child.component_type));
            if !accepted {
                return Err(MutationError::ZoneRejected {
                    zone,
                    component_type: child.component_type.clone(),
                });
            }
            self.validate_template(child)?;
        }
        Ok(())
    }

    /// Allocate ids and flatten a validated template in pre-order.
    fn build_subtree(
        &mut self,
        template: &NodeTemplate,
        parent: Option<NodeId>,
        zone: Option<String>,
        out: &mut Vec<Node>,
    ) -> Result<NodeId, MutationError> {
        let schema = rules::schema_of(&self.registry, &template.component_type)?;
        let props = schema.with_defaults(&template.props);
        let child_zones = template
            .children
            .iter()
            .map(|child| child_zone(schema, child))
            .collect::<Result<Vec<_>, _>>()?;

        let id = self.ids.new_id();
        let mut node = Node::new(id.clone(), template.component_type.clone()).with_props(props);
        node.parent_id = parent;
        node.zone_id = zone;

        let slot = out.len();
        out.push(node);

        let mut children = Vec::with_capacity(template.children.len());
        for (child, child_zone) in template.children.iter().zip(child_zones) {
            children.push(self.build_subtree(child, Some(id.clone()), Some(child_zone), out)?);
        }
        out[slot].children = children;

        Ok(id)
    }
}

fn child_zone(schema: &Schema, child: &NodeTemplate) -> Result<String, MutationError> {
    child
        .zone
        .clone()
        .or_else(|| schema.default_zone.clone())
        .ok_or_else(|| MutationError::ZoneRejected {
            zone: String::from("<default>"),
            component_type: child.component_type.clone(),
        })
}

fn validate_props(schema: &Schema, component_type: &str, props: &Props) -> Result<(), MutationError> {
    for (name, value) in props {
        let spec = schema.props.get(name).ok_or_else(|| MutationError::InvalidPropValue {
            prop: name.clone(),
            reason: format!("'{}' has no prop named '{}'", component_type, name),
        })?;
        if value == &PropValue::Null {
            continue;
        }
        spec.kind
            .check(value)
            .map_err(|reason| MutationError::InvalidPropValue {
                prop: name.clone(),
                reason,
            })?;
    }
    Ok(())
}
