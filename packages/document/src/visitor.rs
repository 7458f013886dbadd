use crate::document::{Document, Node};

/// Visitor pattern for traversing the page tree immutably
///
/// The default implementations walk the whole tree in document order.
/// Override `visit_node` and skip the call to [`walk_node`] to prune a
/// subtree.
pub trait Visitor: Sized {
    fn visit_document(&mut self, doc: &Document) {
        walk_document(self, doc);
    }

    fn visit_node(&mut self, doc: &Document, node: &Node) {
        walk_node(self, doc, node);
    }
}

pub fn walk_document<V: Visitor>(visitor: &mut V, doc: &Document) {
    for id in doc.root_children() {
        if let Some(node) = doc.node(id) {
            visitor.visit_node(doc, node);
        }
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, doc: &Document, node: &Node) {
    for id in &node.children {
        if let Some(child) = doc.node(id) {
            visitor.visit_node(doc, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;

    struct VisibleTypes(Vec<String>);

    impl Visitor for VisibleTypes {
        fn visit_node(&mut self, doc: &Document, node: &Node) {
            if node.hidden {
                return;
            }
            self.0.push(node.component_type.clone());
            walk_node(self, doc, node);
        }
    }

    #[test]
    fn test_visitor_can_prune_subtrees() {
        let mut root = Node::new(NodeId::from("a"), "Container");
        root.children = vec![NodeId::from("b"), NodeId::from("c")];
        let mut hidden = Node::new(NodeId::from("b"), "Columns");
        hidden.parent_id = Some(NodeId::from("a"));
        hidden.hidden = true;
        hidden.children = vec![NodeId::from("d")];
        let mut text = Node::new(NodeId::from("c"), "Text");
        text.parent_id = Some(NodeId::from("a"));
        let mut inner = Node::new(NodeId::from("d"), "Image");
        inner.parent_id = Some(NodeId::from("b"));

        let doc = Document::from_parts(vec![NodeId::from("a")], vec![root, hidden, text, inner]);

        let mut visitor = VisibleTypes(Vec::new());
        visitor.visit_document(&doc);
        assert_eq!(visitor.0, vec!["Container", "Text"]);
    }
}
