//! Structural invariant checks for a [`Document`].

use crate::document::Document;
use crate::id::NodeId;
use pagecraft_schema::SchemaRegistry;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("{parent} lists missing child {child}")]
    DanglingChild { parent: String, child: NodeId },

    #[error("{0} appears in more than one children list")]
    MultipleOwners(NodeId),

    #[error("{node} is listed under {listed_under} but its parentId is {parent_id:?}")]
    ParentMismatch {
        node: NodeId,
        listed_under: String,
        parent_id: Option<NodeId>,
    },

    #[error("{0} is not reachable from the root")]
    Unreachable(NodeId),

    #[error("{0} is its own ancestor")]
    Cycle(NodeId),

    #[error("{node} has unknown component type '{component_type}'")]
    UnknownComponentType { node: NodeId, component_type: String },

    #[error("{node} of type '{component_type}' is not accepted by zone '{zone}'")]
    ZoneRejected {
        node: NodeId,
        component_type: String,
        zone: String,
    },

    #[error("{0} is a root child but names a zone")]
    RootZone(NodeId),
}

const ROOT: &str = "<root>";

/// Check every structural invariant, returning all violations found.
pub fn check_invariants(doc: &Document, registry: &SchemaRegistry) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut owner: HashMap<&NodeId, Option<&NodeId>> = HashMap::new();

    // Referential integrity and single ownership
    let lists = std::iter::once((None, doc.root_children()))
        .chain(doc.nodes().map(|node| (Some(&node.id), node.children.as_slice())));
    for (parent, children) in lists {
        let parent_name = parent.map_or(ROOT.to_string(), |id| id.to_string());
        for child in children {
            let Some(node) = doc.node(child) else {
                violations.push(InvariantViolation::DanglingChild {
                    parent: parent_name.clone(),
                    child: child.clone(),
                });
                continue;
            };
            if owner.insert(child, parent).is_some() {
                violations.push(InvariantViolation::MultipleOwners(child.clone()));
            }
            if node.parent_id.as_ref() != parent {
                violations.push(InvariantViolation::ParentMismatch {
                    node: child.clone(),
                    listed_under: parent_name.clone(),
                    parent_id: node.parent_id.clone(),
                });
            }
        }
    }

    // Reachability and acyclicity
    let mut seen: HashSet<&NodeId> = HashSet::new();
    let mut stack: Vec<&NodeId> = doc.root_children().iter().collect();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            violations.push(InvariantViolation::Cycle(id.clone()));
            continue;
        }
        if let Some(node) = doc.node(id) {
            stack.extend(node.children.iter());
        }
    }
    for id in doc.node_ids() {
        if !seen.contains(id) {
            violations.push(InvariantViolation::Unreachable(id.clone()));
        }
    }

    // Schema legality
    for node in doc.nodes() {
        if !registry.contains(&node.component_type) {
            violations.push(InvariantViolation::UnknownComponentType {
                node: node.id.clone(),
                component_type: node.component_type.clone(),
            });
        }

        match (&node.parent_id, &node.zone_id) {
            (None, Some(_)) => violations.push(InvariantViolation::RootZone(node.id.clone())),
            (None, None) => {
                if !registry.root_zone().accepts(&node.component_type) {
                    violations.push(InvariantViolation::ZoneRejected {
                        node: node.id.clone(),
                        component_type: node.component_type.clone(),
                        zone: ROOT.to_string(),
                    });
                }
            }
            (Some(parent), Some(zone)) => {
                let accepted = doc
                    .node(parent)
                    .and_then(|p| registry.get(&p.component_type))
                    .and_then(|schema| schema.zone_spec(zone))
                    .is_some_and(|spec| spec.accepts(&node.component_type));
                if !accepted {
                    violations.push(InvariantViolation::ZoneRejected {
                        node: node.id.clone(),
                        component_type: node.component_type.clone(),
                        zone: zone.clone(),
                    });
                }
            }
            (Some(_), None) => {}
        }
    }

    violations
}
