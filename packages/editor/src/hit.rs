//! Hit testing: pointer position → node and drop target.
//!
//! Geometry comes from the external renderer as [`LayoutHints`]; the core
//! never inspects visual output.

use crate::projection::{RenderNode, RenderTree};
use crate::rules;
use pagecraft_document::{Document, NodeId};
use pagecraft_schema::SchemaRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fraction of a node's height treated as a before/after band
const EDGE_BAND: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Layout reported by the renderer for the current canvas
#[derive(Debug, Clone, Default)]
pub struct LayoutHints {
    pub nodes: HashMap<NodeId, Rect>,
    pub zones: HashMap<(NodeId, String), Rect>,
}

impl LayoutHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_node(&mut self, id: NodeId, rect: Rect) -> &mut Self {
        self.nodes.insert(id, rect);
        self
    }

    pub fn set_zone(&mut self, id: NodeId, zone: impl Into<String>, rect: Rect) -> &mut Self {
        self.zones.insert((id, zone.into()), rect);
        self
    }

    pub fn node(&self, id: &NodeId) -> Option<Rect> {
        self.nodes.get(id).copied()
    }

    pub fn zone(&self, id: &NodeId, zone: &str) -> Option<Rect> {
        self.zones.get(&(id.clone(), zone.to_string())).copied()
    }
}

/// Candidate destination; `index` is relative to the zone's members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub parent: Option<NodeId>,
    pub zone: Option<String>,
    pub index: usize,
}

/// Deepest projected node under the pointer.
pub fn hit_test(tree: &RenderTree, layout: &LayoutHints, point: Point) -> Option<NodeId> {
    tree.roots
        .iter()
        .rev()
        .find_map(|root| hit_test_node(root, layout, point))
}

fn hit_test_node(node: &RenderNode, layout: &LayoutHints, point: Point) -> Option<NodeId> {
    // Last painted child is on top
    for child in node.children.iter().rev() {
        if let Some(hit) = hit_test_node(child, layout, point) {
            return Some(hit);
        }
    }

    layout
        .node(node.id())
        .filter(|rect| rect.contains(point))
        .map(|_| node.id().clone())
}

/// Work out where a drop at `point` would land.
pub fn resolve_drop_target(
    doc: &Document,
    registry: &SchemaRegistry,
    tree: &RenderTree,
    layout: &LayoutHints,
    point: Point,
) -> Option<DropTarget> {
    let hit = hit_test(tree, layout, point)?;
    let node = doc.node(&hit)?;
    let rect = layout.node(&hit)?;
    let schema = registry.get(&node.component_type);

    // Inside one of the node's zones
    if let Some(schema) = schema {
        for zone in schema.zones.keys() {
            if layout.zone(&hit, zone).is_some_and(|r| r.contains(point)) {
                return Some(DropTarget {
                    parent: Some(hit.clone()),
                    zone: Some(zone.clone()),
                    index: index_by_midpoint(doc, layout, &hit, zone, point),
                });
            }
        }
    }

    let own_index = rules::zone_index(doc, &hit)?;
    let before = DropTarget {
        parent: node.parent_id.clone(),
        zone: node.zone_id.clone(),
        index: own_index,
    };
    let after = DropTarget {
        index: own_index + 1,
        ..before.clone()
    };

    let band = rect.height * EDGE_BAND;
    if point.y < rect.y + band {
        return Some(before);
    }
    if point.y > rect.bottom() - band {
        return Some(after);
    }

    if let Some(zone) = schema.and_then(|s| s.default_zone.as_ref()) {
        return Some(DropTarget {
            parent: Some(hit.clone()),
            zone: Some(zone.clone()),
            index: zone_members(doc, &hit, zone).count(),
        });
    }

    Some(if point.y < rect.mid_y() { before } else { after })
}

fn zone_members<'a>(
    doc: &'a Document,
    parent: &NodeId,
    zone: &'a str,
) -> impl Iterator<Item = &'a NodeId> + 'a {
    doc.children_of(Some(parent))
        .unwrap_or_default()
        .iter()
        .filter(move |id| doc.node(id).and_then(|n| n.zone_id.as_deref()) == Some(zone))
}

fn index_by_midpoint(
    doc: &Document,
    layout: &LayoutHints,
    parent: &NodeId,
    zone: &str,
    point: Point,
) -> usize {
    let members: Vec<&NodeId> = zone_members(doc, parent, zone).collect();
    members
        .iter()
        .position(|id| layout.node(id).is_some_and(|r| point.y < r.mid_y()))
        .unwrap_or(members.len())
}
