//! # Projection Layer
//!
//! Derives the visible render tree from a document and the UI state.
//!
//! - `Canvas` mode never shows hidden nodes and ignores collapse state
//! - `Layers` mode honours `expanded` and the `show_hidden` override
//! - A search query keeps matching nodes plus their ancestors, and
//!   force-expands those ancestors
//!
//! [`Projector`] keeps the previous result and hands back the same
//! `Arc<RenderNode>` for any subtree whose nodes and flags did not change,
//! so memoized consumers can compare by pointer.

use pagecraft_document::{Document, Node, NodeId};
use pagecraft_schema::SchemaRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProjectionMode {
    #[default]
    Canvas,
    Layers,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub expanded: HashSet<NodeId>,
    pub search_query: Option<String>,

    /// Layers view only
    pub show_hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub node: Arc<Node>,
    pub label: String,
    pub expanded: bool,

    /// The node itself matched the search query
    pub matched: bool,
    pub children: Vec<Arc<RenderNode>>,
}

impl RenderNode {
    pub fn id(&self) -> &NodeId {
        &self.node.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderTree {
    pub roots: Vec<Arc<RenderNode>>,
    pub mode: ProjectionMode,
}

impl RenderTree {
    /// Flattened `(depth, node)` rows; collapsed nodes hide their children
    /// in the layers view.
    pub fn rows(&self) -> Vec<(usize, &RenderNode)> {
        let mut rows = Vec::new();
        let mut stack: Vec<(usize, &RenderNode)> =
            self.roots.iter().rev().map(|n| (0, n.as_ref())).collect();
        while let Some((depth, node)) = stack.pop() {
            rows.push((depth, node));
            if node.expanded {
                stack.extend(node.children.iter().rev().map(|c| (depth + 1, c.as_ref())));
            }
        }
        rows
    }

    pub fn find(&self, id: &NodeId) -> Option<&Arc<RenderNode>> {
        let mut stack: Vec<&Arc<RenderNode>> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.id() == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    /// Number of projected nodes, including collapsed ones
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Arc<RenderNode>> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Display label: `label` prop, then the schema text prop, then the type.
pub fn node_label(registry: &SchemaRegistry, node: &Node) -> String {
    if let Some(label) = node.prop_str("label").filter(|l| !l.is_empty()) {
        return label.to_string();
    }
    registry
        .get(&node.component_type)
        .and_then(|schema| schema.text_prop.as_deref())
        .and_then(|prop| node.prop_str(prop))
        .filter(|text| !text.is_empty())
        .map_or_else(|| node.component_type.clone(), str::to_string)
}

/// One-off projection without memoization
pub fn project(
    doc: &Document,
    registry: &SchemaRegistry,
    ui: &UiState,
    mode: ProjectionMode,
) -> RenderTree {
    let mut builder = Builder::new(doc, registry, ui, mode, search_query(ui), None);
    let roots = builder.build_all(doc.root_children());
    RenderTree { roots, mode }
}

fn search_query(ui: &UiState) -> Option<String> {
    ui.search_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

/// Previous projection of one mode, and the query it was built with
#[derive(Debug, Default)]
struct Cache {
    query: Option<String>,
    nodes: HashMap<NodeId, Arc<RenderNode>>,
}

/// Incremental projector that reuses unchanged subtrees
///
/// Each mode keeps its own cache, so switching between the canvas and the
/// layers panel does not throw away the other view's nodes. A node whose
/// `Arc<Node>` is unchanged keeps its label, and keeps its match flag as
/// long as the query is the same.
#[derive(Debug)]
pub struct Projector {
    registry: Arc<SchemaRegistry>,
    caches: HashMap<ProjectionMode, Cache>,
}

impl Projector {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            caches: HashMap::new(),
        }
    }

    pub fn project(&mut self, doc: &Document, ui: &UiState, mode: ProjectionMode) -> RenderTree {
        let query = search_query(ui);
        let cache = self.caches.remove(&mode).unwrap_or_default();
        let previous = Previous {
            nodes: &cache.nodes,
            same_query: cache.query == query,
        };

        let mut builder = Builder::new(doc, &self.registry, ui, mode, query.clone(), Some(previous));
        let roots = builder.build_all(doc.root_children());
        let nodes = builder.next;

        self.caches.insert(mode, Cache { query, nodes });
        RenderTree { roots, mode }
    }
}

struct Previous<'a> {
    nodes: &'a HashMap<NodeId, Arc<RenderNode>>,
    same_query: bool,
}

struct Builder<'a> {
    doc: &'a Document,
    registry: &'a SchemaRegistry,
    ui: &'a UiState,
    mode: ProjectionMode,
    query: Option<String>,
    previous: Option<Previous<'a>>,
    next: HashMap<NodeId, Arc<RenderNode>>,
}

impl<'a> Builder<'a> {
    fn new(
        doc: &'a Document,
        registry: &'a SchemaRegistry,
        ui: &'a UiState,
        mode: ProjectionMode,
        query: Option<String>,
        previous: Option<Previous<'a>>,
    ) -> Self {
        Self {
            doc,
            registry,
            ui,
            mode,
            query,
            previous,
            next: HashMap::new(),
        }
    }

    fn build_all(&mut self, ids: &[NodeId]) -> Vec<Arc<RenderNode>> {
        ids.iter().filter_map(|id| self.build(id)).collect()
    }

    fn build(&mut self, id: &NodeId) -> Option<Arc<RenderNode>> {
        let node = self.doc.node_arc(id)?;
        let show_hidden = self.mode == ProjectionMode::Layers && self.ui.show_hidden;
        if node.hidden && !show_hidden {
            return None;
        }

        // Same node value as last time: label and match flag still hold
        let (previous, same_query) = match &self.previous {
            Some(previous) => (
                previous
                    .nodes
                    .get(id)
                    .filter(|prev| Arc::ptr_eq(&prev.node, node))
                    .cloned(),
                previous.same_query,
            ),
            None => (None, false),
        };
        let matched = match &previous {
            Some(prev) if same_query => prev.matched,
            _ => self.matches(node),
        };

        let children = self.build_all(&node.children);
        if self.query.is_some() && !matched && children.is_empty() {
            return None;
        }

        let expanded = match self.mode {
            ProjectionMode::Canvas => true,
            ProjectionMode::Layers => {
                self.ui.expanded.contains(id) || (self.query.is_some() && !children.is_empty())
            }
        };

        let render = match previous {
            Some(prev)
                if prev.expanded == expanded
                    && prev.matched == matched
                    && prev.children.len() == children.len()
                    && prev
                        .children
                        .iter()
                        .zip(&children)
                        .all(|(a, b)| Arc::ptr_eq(a, b)) =>
            {
                prev
            }
            Some(prev) => Arc::new(RenderNode {
                node: Arc::clone(node),
                label: prev.label.clone(),
                expanded,
                matched,
                children,
            }),
            None => Arc::new(RenderNode {
                node: Arc::clone(node),
                label: node_label(self.registry, node),
                expanded,
                matched,
                children,
            }),
        };
        self.next.insert(id.clone(), Arc::clone(&render));
        Some(render)
    }

    fn matches(&self, node: &Node) -> bool {
        self.query.as_deref().is_some_and(|q| {
            node_label(self.registry, node).to_lowercase().contains(q)
                || node.component_type.to_lowercase().contains(q)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutations::MutationEngine;
    use pagecraft_document::IdGenerator;
    use pagecraft_schema::{standard_registry, Props};
    use serde_json::json;

    struct Fixture {
        registry: Arc<SchemaRegistry>,
        doc: Document,
        section: NodeId,
        heading: NodeId,
        spacer: NodeId,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(standard_registry());
        let mut engine = MutationEngine::new(registry.clone(), IdGenerator::from_seed("p"));
        let props = |v| serde_json::from_value::<Props>(v).unwrap();

        let r = engine
            .insert(&Document::new(), None, None, 0, "Section", props(json!({ "label": "Hero" })))
            .unwrap();
        let section = r.created.clone();
        let r = engine
            .insert(&r.document, Some(&section), None, 0, "Heading", props(json!({ "text": "Welcome" })))
            .unwrap();
        let heading = r.created.clone();
        let r = engine
            .insert(&r.document, None, None, 1, "Spacer", Props::new())
            .unwrap();
        let spacer = r.created.clone();

        Fixture {
            registry,
            doc: r.document,
            section,
            heading,
            spacer,
        }
    }

    #[test]
    fn test_labels() {
        let f = fixture();
        let tree = project(&f.doc, &f.registry, &UiState::default(), ProjectionMode::Canvas);
        let labels: Vec<_> = tree.rows().iter().map(|(_, n)| n.label.clone()).collect();
        assert_eq!(labels, vec!["Hero", "Welcome", "Spacer"]);
    }

    #[test]
    fn test_hidden_nodes() {
        let mut f = fixture();
        let mut engine = MutationEngine::new(f.registry.clone(), IdGenerator::from_seed("x"));
        f.doc = engine.set_hidden(&f.doc, &f.section, true).unwrap().document;

        let canvas = project(
            &f.doc,
            &f.registry,
            &UiState {
                show_hidden: true,
                ..UiState::default()
            },
            ProjectionMode::Canvas,
        );
        assert_eq!(canvas.len(), 1);

        let layers = project(
            &f.doc,
            &f.registry,
            &UiState {
                show_hidden: true,
                ..UiState::default()
            },
            ProjectionMode::Layers,
        );
        assert_eq!(layers.len(), 3);
    }

    #[test]
    fn test_layers_collapse() {
        let f = fixture();
        let mut ui = UiState::default();
        let tree = project(&f.doc, &f.registry, &ui, ProjectionMode::Layers);
        assert_eq!(tree.rows().len(), 2);

        ui.expanded.insert(f.section.clone());
        let tree = project(&f.doc, &f.registry, &ui, ProjectionMode::Layers);
        let rows: Vec<_> = tree.rows().iter().map(|(d, n)| (*d, n.id().clone())).collect();
        assert_eq!(
            rows,
            vec![(0, f.section.clone()), (1, f.heading.clone()), (0, f.spacer.clone())]
        );
    }

    #[test]
    fn test_search_keeps_ancestors() {
        let f = fixture();
        let ui = UiState {
            search_query: Some("WELC".into()),
            ..UiState::default()
        };
        let tree = project(&f.doc, &f.registry, &ui, ProjectionMode::Layers);

        assert_eq!(tree.roots.len(), 1);
        let section = &tree.roots[0];
        assert!(!section.matched);
        assert!(section.expanded);
        assert!(section.children[0].matched);
        assert_eq!(tree.rows().len(), 2);
    }

    #[test]
    fn test_projector_reuses_unchanged_subtrees() {
        let f = fixture();
        let mut projector = Projector::new(f.registry.clone());
        let ui = UiState::default();
        let before = projector.project(&f.doc, &ui, ProjectionMode::Canvas);

        let mut engine = MutationEngine::new(f.registry.clone(), IdGenerator::from_seed("x"));
        let patch = serde_json::from_value::<Props>(json!({ "height": 64 })).unwrap();
        let doc = engine.set_props(&f.doc, &f.spacer, &patch).unwrap().document;
        let after = projector.project(&doc, &ui, ProjectionMode::Canvas);

        assert!(Arc::ptr_eq(&before.roots[0], &after.roots[0]));
        assert!(!Arc::ptr_eq(&before.roots[1], &after.roots[1]));
    }

    #[test]
    fn test_projector_rederives_matches_when_query_changes() {
        let f = fixture();
        let mut projector = Projector::new(f.registry.clone());
        let mut ui = UiState {
            search_query: Some("hero".into()),
            ..UiState::default()
        };

        let first = projector.project(&f.doc, &ui, ProjectionMode::Layers);
        assert_eq!(first.roots.len(), 1);
        assert!(first.roots[0].matched);

        // Same query, same document: every node comes back untouched
        let again = projector.project(&f.doc, &ui, ProjectionMode::Layers);
        assert!(Arc::ptr_eq(&first.roots[0], &again.roots[0]));

        ui.search_query = Some("welcome".into());
        let second = projector.project(&f.doc, &ui, ProjectionMode::Layers);
        assert_eq!(second.roots.len(), 1);
        assert!(!second.roots[0].matched);
        assert!(second.roots[0].children[0].matched);

        ui.search_query = None;
        let cleared = projector.project(&f.doc, &ui, ProjectionMode::Layers);
        assert_eq!(cleared.roots.len(), 2);
        assert!(cleared.rows().iter().all(|(_, node)| !node.matched));
    }

    #[test]
    fn test_projector_matches_equal_fresh_projection() {
        let f = fixture();
        let mut projector = Projector::new(f.registry.clone());
        let queries = [None, Some("spa"), Some("spa"), Some("HERO"), None];

        for query in queries {
            let ui = UiState {
                search_query: query.map(str::to_string),
                expanded: [f.section.clone()].into_iter().collect(),
                ..UiState::default()
            };
            let cached = projector.project(&f.doc, &ui, ProjectionMode::Layers);
            let fresh = project(&f.doc, &f.registry, &ui, ProjectionMode::Layers);
            assert_eq!(cached, fresh, "query {:?}", query);
        }
    }
}
