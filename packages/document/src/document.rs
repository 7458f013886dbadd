use crate::id::NodeId;
use pagecraft_schema::{PropValue, Props};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One component instance in the page tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    /// Component type; never changes for the node's lifetime
    #[serde(rename = "type")]
    pub component_type: String,

    #[serde(default)]
    pub props: Props,

    #[serde(default)]
    pub children: Vec<NodeId>,

    #[serde(default)]
    pub parent_id: Option<NodeId>,

    #[serde(default)]
    pub zone_id: Option<String>,

    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub hidden: bool,
}

impl Node {
    pub fn new(id: NodeId, component_type: impl Into<String>) -> Self {
        Self {
            id,
            component_type: component_type.into(),
            props: Props::new(),
            children: Vec::new(),
            parent_id: None,
            zone_id: None,
            locked: false,
            hidden: false,
        }
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    pub fn prop_str(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(PropValue::as_str)
    }
}

/// Immutable snapshot of the page tree.
///
/// Cloning is cheap relative to the tree size: node records are shared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    root_children: Vec<NodeId>,
    nodes: BTreeMap<NodeId, Arc<Node>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from raw parts without checking invariants.
    ///
    /// Used by storage adapters; run [`crate::check_invariants`] on the
    /// result before editing it.
    pub fn from_parts(root_children: Vec<NodeId>, nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            root_children,
            nodes: nodes
                .into_iter()
                .map(|node| (node.id.clone(), Arc::new(node)))
                .collect(),
        }
    }

    pub fn root_children(&self) -> &[NodeId] {
        &self.root_children
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    /// The shared record for a node. Two documents return pointer-equal
    /// `Arc`s for a node that no mutation has touched in between.
    pub fn node_arc(&self, id: &NodeId) -> Option<&Arc<Node>> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(Arc::as_ref)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children list of a parent, or the root list for `None`
    pub fn children_of(&self, parent: Option<&NodeId>) -> Option<&[NodeId]> {
        match parent {
            None => Some(&self.root_children),
            Some(id) => self.node(id).map(|node| node.children.as_slice()),
        }
    }

    /// Absolute index of a node within its parent's children (or root list)
    pub fn index_in_parent(&self, id: &NodeId) -> Option<usize> {
        let node = self.node(id)?;
        self.children_of(node.parent_id.as_ref())?
            .iter()
            .position(|child| child == id)
    }

    /// Walk from a node's parent up to the root.
    pub fn ancestors<'a>(&'a self, id: &NodeId) -> Ancestors<'a> {
        Ancestors {
            doc: self,
            next: self.node(id).and_then(|node| node.parent_id.as_ref()),
            steps: 0,
        }
    }

    /// True when `id` is `ancestor` or lies inside its subtree.
    pub fn is_within(&self, id: &NodeId, ancestor: &NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|node| &node.id == ancestor)
    }

    /// The node and all of its descendants in pre-order.
    pub fn subtree(&self, id: &NodeId) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node(current) {
                out.push(node);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Depth of a node; root children are at depth 0.
    pub fn depth(&self, id: &NodeId) -> usize {
        self.ancestors(id).count()
    }

    // Crate-internal writers used by `apply_committed` on a fresh clone.

    pub(crate) fn children_mut(&mut self, parent: Option<&NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            None => Some(&mut self.root_children),
            Some(id) => self
                .nodes
                .get_mut(id)
                .map(|node| &mut Arc::make_mut(node).children),
        }
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).map(Arc::make_mut)
    }

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), Arc::new(node));
    }

    pub(crate) fn remove_node(&mut self, id: &NodeId) -> Option<Arc<Node>> {
        self.nodes.remove(id)
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<&'a NodeId>,
    steps: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        // A corrupt parent chain must not loop forever
        if self.steps > self.doc.len() {
            return None;
        }
        let node = self.doc.node(self.next?)?;
        self.steps += 1;
        self.next = node.parent_id.as_ref();
        Some(node)
    }
}
