//! Placement rules shared by the mutation engine and the drag preview.
//!
//! Everything here is a pure read of the current document; nothing is
//! applied. The drag coordinator calls these on every pointer move to pick
//! an "allowed" or "rejected" indicator, and the engine calls the same
//! functions before committing.

use crate::mutations::MutationError;
use pagecraft_document::{Document, NodeId};
use pagecraft_schema::{Schema, SchemaRegistry};

pub(crate) fn schema_of<'r>(
    registry: &'r SchemaRegistry,
    component_type: &str,
) -> Result<&'r Schema, MutationError> {
    registry
        .get(component_type)
        .ok_or_else(|| MutationError::UnknownComponentType(component_type.to_string()))
}

/// Resolve the zone a child would land in.
///
/// Root placements never carry a zone. Under a parent, an omitted zone
/// falls back to the parent schema's default zone.
pub(crate) fn resolve_zone(
    doc: &Document,
    registry: &SchemaRegistry,
    parent: Option<&NodeId>,
    zone: Option<&str>,
) -> Result<Option<String>, MutationError> {
    let Some(parent_id) = parent else {
        return match zone {
            None => Ok(None),
            Some(zone) => Err(MutationError::ZoneRejected {
                zone: zone.to_string(),
                component_type: String::new(),
            }),
        };
    };

    let parent = doc
        .node(parent_id)
        .ok_or_else(|| MutationError::NodeNotFound(parent_id.clone()))?;
    let schema = schema_of(registry, &parent.component_type)?;

    let zone = zone
        .map(str::to_string)
        .or_else(|| schema.default_zone.clone())
        .ok_or_else(|| MutationError::ZoneRejected {
            zone: String::from("<default>"),
            component_type: String::new(),
        })?;

    if schema.zone_spec(&zone).is_none() {
        return Err(MutationError::ZoneRejected {
            zone,
            component_type: String::new(),
        });
    }
    Ok(Some(zone))
}

/// Does the zone (or the root) accept this component type?
pub(crate) fn check_accepts(
    doc: &Document,
    registry: &SchemaRegistry,
    parent: Option<&NodeId>,
    zone: Option<&str>,
    component_type: &str,
) -> Result<(), MutationError> {
    schema_of(registry, component_type)?;

    let accepted = match (parent, zone) {
        (None, _) => registry.root_zone().accepts(component_type),
        (Some(parent), Some(zone)) => doc
            .node(parent)
            .and_then(|p| registry.get(&p.component_type))
            .and_then(|schema| schema.zone_spec(zone))
            .is_some_and(|spec| spec.accepts(component_type)),
        (Some(_), None) => false,
    };

    if accepted {
        Ok(())
    } else {
        Err(MutationError::ZoneRejected {
            zone: zone.unwrap_or("<root>").to_string(),
            component_type: component_type.to_string(),
        })
    }
}

fn is_locked(doc: &Document, id: &NodeId) -> bool {
    doc.node(id).is_some_and(|node| node.locked)
}

/// Validate inserting a new node of `component_type`; returns the zone it
/// would be placed in.
pub fn check_insert(
    doc: &Document,
    registry: &SchemaRegistry,
    parent: Option<&NodeId>,
    zone: Option<&str>,
    component_type: &str,
) -> Result<Option<String>, MutationError> {
    schema_of(registry, component_type)?;
    let zone = resolve_zone(doc, registry, parent, zone).map_err(|e| e.for_type(component_type))?;

    if let Some(parent) = parent {
        if is_locked(doc, parent) {
            return Err(MutationError::ParentLocked(parent.clone()));
        }
    }

    check_accepts(doc, registry, parent, zone.as_deref(), component_type)?;
    Ok(zone)
}

/// Validate moving `node` under `parent`/`zone`; returns the resolved zone.
pub fn check_move(
    doc: &Document,
    registry: &SchemaRegistry,
    node: &NodeId,
    parent: Option<&NodeId>,
    zone: Option<&str>,
) -> Result<Option<String>, MutationError> {
    let source = doc
        .node(node)
        .ok_or_else(|| MutationError::NodeNotFound(node.clone()))?;
    if source.locked {
        return Err(MutationError::NodeLocked(node.clone()));
    }

    if let Some(parent) = parent {
        if doc.is_within(parent, node) {
            return Err(MutationError::CycleDetected {
                node: node.clone(),
                destination: parent.clone(),
            });
        }
    }

    let zone = resolve_zone(doc, registry, parent, zone)
        .map_err(|e| e.for_type(&source.component_type))?;

    if let Some(parent) = parent {
        if is_locked(doc, parent) {
            return Err(MutationError::NodeLocked(parent.clone()));
        }
    }

    check_accepts(doc, registry, parent, zone.as_deref(), &source.component_type)?;
    Ok(zone)
}

/// First locked node in a subtree, if any
pub(crate) fn locked_in_subtree(doc: &Document, id: &NodeId) -> Option<NodeId> {
    doc.subtree(id)
        .into_iter()
        .find(|node| node.locked)
        .map(|node| node.id.clone())
}

/// Absolute children-list position for a zone-relative index.
///
/// `siblings` is the parent's children list (with any moving node already
/// removed). The index is clamped to `[0, zone_len]`.
pub(crate) fn zone_position(
    doc: &Document,
    siblings: &[NodeId],
    zone: Option<&str>,
    index: usize,
) -> usize {
    let members: Vec<usize> = siblings
        .iter()
        .enumerate()
        .filter(|(_, id)| doc.node(id).and_then(|n| n.zone_id.as_deref()) == zone)
        .map(|(position, _)| position)
        .collect();

    match members.get(index) {
        Some(&position) => position,
        None => members.last().map_or(siblings.len(), |&last| last + 1),
    }
}

/// Zone-relative index of a node among its zone siblings
pub(crate) fn zone_index(doc: &Document, id: &NodeId) -> Option<usize> {
    let node = doc.node(id)?;
    doc.children_of(node.parent_id.as_ref())?
        .iter()
        .filter(|sibling| {
            doc.node(sibling).and_then(|n| n.zone_id.as_deref()) == node.zone_id.as_deref()
        })
        .position(|sibling| sibling == id)
}
