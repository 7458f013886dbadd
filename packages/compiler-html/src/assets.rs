//! Asset manifest extraction
//!
//! Every prop whose schema declares an asset kind contributes its URL.
//! Hidden subtrees are skipped like in the markup pass. A URL used by
//! several nodes is listed once, ids are `asset-{n}` in document order.

use pagecraft_document::{walk_node, Document, Node, Visitor};
use pagecraft_schema::{AssetKind, PropValue, SchemaRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub id: String,
    pub url: String,
    pub kind: AssetKind,
}

pub fn collect_assets(doc: &Document, registry: &SchemaRegistry) -> Vec<AssetRef> {
    let mut collector = AssetCollector {
        registry,
        seen: HashSet::new(),
        assets: Vec::new(),
    };
    collector.visit_document(doc);
    collector.assets
}

struct AssetCollector<'a> {
    registry: &'a SchemaRegistry,
    seen: HashSet<String>,
    assets: Vec<AssetRef>,
}

impl Visitor for AssetCollector<'_> {
    fn visit_node(&mut self, doc: &Document, node: &Node) {
        if node.hidden {
            return;
        }

        if let Some(schema) = self.registry.get(&node.component_type) {
            for (name, spec) in &schema.props {
                let Some(kind) = spec.asset else {
                    continue;
                };
                let url = match node.prop(name) {
                    Some(PropValue::String(url)) => url.trim(),
                    _ => continue,
                };
                if url.is_empty() || !self.seen.insert(url.to_string()) {
                    continue;
                }
                self.assets.push(AssetRef {
                    id: format!("asset-{}", self.assets.len() + 1),
                    url: url.to_string(),
                    kind,
                });
            }
        }

        walk_node(self, doc, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::NodeId;
    use pagecraft_schema::{standard_registry, Props};
    use serde_json::json;

    fn image(id: &str, src: &str) -> Node {
        Node::new(NodeId::from(id), "Image")
            .with_props(serde_json::from_value::<Props>(json!({ "src": src, "alt": "x" })).unwrap())
    }

    fn in_container(children: Vec<Node>) -> Document {
        let mut container = Node::new(NodeId::from("root"), "Container");
        let mut nodes = Vec::new();
        for mut child in children {
            child.parent_id = Some(container.id.clone());
            child.zone_id = Some("content".into());
            container.children.push(child.id.clone());
            nodes.push(child);
        }
        nodes.push(container);
        Document::from_parts(vec![NodeId::from("root")], nodes)
    }

    #[test]
    fn test_assets_deduplicated_in_document_order() {
        let doc = in_container(vec![
            image("a", "/img/hero.png"),
            image("b", "/img/logo.svg"),
            image("c", "/img/hero.png"),
        ]);
        let assets = collect_assets(&doc, &standard_registry());

        assert_eq!(
            assets,
            vec![
                AssetRef {
                    id: "asset-1".into(),
                    url: "/img/hero.png".into(),
                    kind: AssetKind::Image,
                },
                AssetRef {
                    id: "asset-2".into(),
                    url: "/img/logo.svg".into(),
                    kind: AssetKind::Image,
                },
            ]
        );
    }

    #[test]
    fn test_hidden_and_empty_assets_skipped() {
        let mut hidden = image("a", "/img/secret.png");
        hidden.hidden = true;
        let doc = in_container(vec![hidden, image("b", ""), image("c", "/img/ok.png")]);
        let assets = collect_assets(&doc, &standard_registry());

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "asset-1");
        assert_eq!(assets[0].url, "/img/ok.png");
    }

    #[test]
    fn test_asset_ref_serializes_camel_case() {
        let asset = AssetRef {
            id: "asset-1".into(),
            url: "/a.png".into(),
            kind: AssetKind::Image,
        };
        assert_eq!(
            serde_json::to_value(&asset).unwrap(),
            json!({ "id": "asset-1", "url": "/a.png", "kind": "image" })
        );
    }
}
