//! Style collection
//!
//! Walks the visible part of the page and turns every node's style props
//! into declaration blocks.
//!
//! - camelCase keys become kebab-case, custom properties (`--x`) are kept
//! - numbers get `px` unless the property is unitless or the value is zero
//! - `@media <query>` keys hold nested declarations for that query
//! - nodes with identical blocks share one class, numbered in document order
//! - a class is critical when any node inside the first `fold_count`
//!   visible top-level children uses it

use crate::error::{CompileError, CompileResult};
use crate::rules::{CssRule, Declaration};
use pagecraft_document::{walk_node, Document, Node, NodeId, Visitor};
use pagecraft_schema::{is_safe_css_text, PropValue, SchemaRegistry};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

const UNITLESS: &[&str] = &[
    "opacity",
    "z-index",
    "font-weight",
    "line-height",
    "flex",
    "flex-grow",
    "flex-shrink",
    "order",
];

/// All declarations one node contributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StyleBlock {
    pub base: Vec<Declaration>,

    /// `(query, declarations)` in key order
    pub media: Vec<(String, Vec<Declaration>)>,
}

impl StyleBlock {
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.media.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleClass {
    pub name: String,
    pub block: StyleBlock,
    pub critical: bool,
}

impl StyleClass {
    pub fn selector(&self) -> String {
        format!(".{}", self.name)
    }

    /// The unconditional rule, if the block has base declarations
    pub fn base_rule(&self) -> Option<CssRule> {
        if self.block.base.is_empty() {
            return None;
        }
        Some(CssRule::new(self.selector(), self.block.base.clone()))
    }

    pub fn media_rules(&self) -> impl Iterator<Item = CssRule> + '_ {
        self.block.media.iter().map(|(query, declarations)| {
            CssRule::new(self.selector(), declarations.clone()).in_media(query.clone())
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedStyles {
    /// Generated classes in document order
    pub classes: Vec<StyleClass>,

    /// Node id -> generated class name
    pub assignments: BTreeMap<NodeId, String>,
}

impl CollectedStyles {
    pub fn class_for(&self, id: &NodeId) -> Option<&str> {
        self.assignments.get(id).map(String::as_str)
    }
}

/// Collect the style classes of every visible node
pub fn collect_styles(
    doc: &Document,
    registry: &SchemaRegistry,
    class_prefix: &str,
    fold_count: usize,
) -> CompileResult<CollectedStyles> {
    let mut collector = Collector {
        registry,
        class_prefix,
        fold_count,
        top_level_seen: 0,
        in_fold: false,
        by_block: HashMap::new(),
        styles: CollectedStyles::default(),
        error: None,
    };
    collector.visit_document(doc);

    match collector.error {
        Some(err) => Err(err),
        None => Ok(collector.styles),
    }
}

struct Collector<'a> {
    registry: &'a SchemaRegistry,
    class_prefix: &'a str,
    fold_count: usize,
    top_level_seen: usize,
    in_fold: bool,
    by_block: HashMap<StyleBlock, usize>,
    styles: CollectedStyles,
    error: Option<CompileError>,
}

impl Visitor for Collector<'_> {
    fn visit_node(&mut self, doc: &Document, node: &Node) {
        if node.hidden || self.error.is_some() {
            return;
        }

        if node.parent_id.is_none() {
            self.in_fold = self.top_level_seen < self.fold_count;
            self.top_level_seen += 1;
        }

        match self.block_for(node) {
            Ok(block) if !block.is_empty() => self.assign(node, block),
            Ok(_) => {}
            Err(err) => {
                self.error = Some(err);
                return;
            }
        }

        walk_node(self, doc, node);
    }
}

impl Collector<'_> {
    fn block_for(&self, node: &Node) -> CompileResult<StyleBlock> {
        let schema = self.registry.get(&node.component_type).ok_or_else(|| {
            CompileError::UnknownComponentType {
                node: node.id.clone(),
                component_type: node.component_type.clone(),
            }
        })?;

        let mut base = CssRule::new("", Vec::new());
        let mut media: Vec<CssRule> = Vec::new();

        for prop in schema.style_props() {
            let Some(value) = node.prop(prop) else {
                continue;
            };
            let invalid = |reason: String| CompileError::InvalidStyle {
                node: node.id.clone(),
                prop: prop.to_string(),
                reason,
            };

            let map = match value {
                PropValue::Null => continue,
                PropValue::Object(map) => map,
                _ => return Err(invalid("expected an object".into())),
            };

            for (key, declared) in map {
                if !is_safe_css_text(key) {
                    return Err(invalid(format!("'{}' contains forbidden characters", key)));
                }
                if let Some(query) = key.strip_prefix("@media") {
                    let query = normalize_query(query);
                    if query.is_empty() {
                        return Err(invalid(format!("empty media query in '{}'", key)));
                    }
                    let PropValue::Object(nested) = declared else {
                        return Err(invalid(format!("'{}' must hold an object", key)));
                    };
                    let existing = media
                        .iter()
                        .position(|r| r.media_query.as_deref() == Some(query.as_str()));
                    let index = match existing {
                        Some(index) => index,
                        None => {
                            media.push(CssRule::new("", Vec::new()).in_media(query));
                            media.len() - 1
                        }
                    };
                    for (nested_key, nested_value) in nested {
                        if !is_safe_css_text(nested_key) {
                            return Err(invalid(format!(
                                "'{}' contains forbidden characters",
                                nested_key
                            )));
                        }
                        let property = to_kebab_case(nested_key);
                        let value = format_value(&property, nested_value).map_err(invalid)?;
                        media[index].set(&property, &value);
                    }
                } else {
                    let property = to_kebab_case(key);
                    let value = format_value(&property, declared).map_err(invalid)?;
                    base.set(&property, &value);
                }
            }
        }

        Ok(StyleBlock {
            base: base.declarations,
            media: media
                .into_iter()
                .filter(|rule| !rule.is_empty())
                .map(|rule| (rule.media_query.unwrap_or_default(), rule.declarations))
                .collect(),
        })
    }

    fn assign(&mut self, node: &Node, block: StyleBlock) {
        let index = match self.by_block.get(&block) {
            Some(&index) => index,
            None => {
                let index = self.styles.classes.len();
                let name = format!("{}-{}", self.class_prefix, index + 1);
                debug!(class = %name, node_id = %node.id, "New style class");
                self.styles.classes.push(StyleClass {
                    name,
                    block: block.clone(),
                    critical: false,
                });
                self.by_block.insert(block, index);
                index
            }
        };

        let class = &mut self.styles.classes[index];
        class.critical |= self.in_fold;
        self.styles
            .assignments
            .insert(node.id.clone(), class.name.clone());
    }
}

/// `fontSize` -> `font-size`, `WebkitTransition` -> `-webkit-transition`
pub fn to_kebab_case(key: &str) -> String {
    if key.starts_with("--") {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn is_unitless(property: &str) -> bool {
    UNITLESS.contains(&property)
}

/// Render one declared value as CSS text. Values that could end the
/// declaration or the rule are refused.
pub fn format_value(property: &str, value: &PropValue) -> Result<String, String> {
    match value {
        PropValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(format!("'{}' has an empty value", property));
            }
            if !is_safe_css_text(trimmed) {
                return Err(format!("'{}' has a value with forbidden characters", property));
            }
            Ok(trimmed.to_string())
        }
        PropValue::Number(n) => {
            let text = n.to_string();
            if is_unitless(property) || n.as_f64() == Some(0.0) || property.starts_with("--") {
                Ok(text)
            } else {
                Ok(format!("{}px", text))
            }
        }
        _ => Err(format!("'{}' must be a string or a number", property)),
    }
}

fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_schema::{standard_registry, Props};
    use serde_json::json;

    fn node(id: &str, component_type: &str, props: serde_json::Value) -> Node {
        Node::new(NodeId::from(id), component_type)
            .with_props(serde_json::from_value::<Props>(props).unwrap())
    }

    fn doc(nodes: Vec<Node>) -> Document {
        let roots = nodes.iter().map(|n| n.id.clone()).collect();
        Document::from_parts(roots, nodes)
    }

    #[test]
    fn test_value_formatting() {
        assert_eq!(format_value("padding", &json!(16)).unwrap(), "16px");
        assert_eq!(format_value("margin", &json!(0)).unwrap(), "0");
        assert_eq!(format_value("opacity", &json!(0.5)).unwrap(), "0.5");
        assert_eq!(format_value("z-index", &json!(10)).unwrap(), "10");
        assert_eq!(format_value("color", &json!("  red ")).unwrap(), "red");
        assert!(format_value("color", &json!(true)).is_err());
        assert!(format_value("color", &json!("")).is_err());
        assert!(format_value("color", &json!("red}body{display:none")).is_err());
        assert!(format_value("color", &json!("red; margin: 0")).is_err());
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("fontSize"), "font-size");
        assert_eq!(to_kebab_case("background-color"), "background-color");
        assert_eq!(to_kebab_case("WebkitTransition"), "-webkit-transition");
        assert_eq!(to_kebab_case("--brandColor"), "--brandColor");
    }

    #[test]
    fn test_identical_blocks_share_a_class() {
        let registry = standard_registry();
        let d = doc(vec![
            node("a", "Spacer", json!({ "style": { "marginTop": 8 } })),
            node("b", "Spacer", json!({ "style": { "background": "red" } })),
            node("c", "Spacer", json!({ "style": { "marginTop": 8 } })),
            node("d", "Spacer", json!({})),
        ]);
        let styles = collect_styles(&d, &registry, "pc", 3).unwrap();

        assert_eq!(styles.classes.len(), 2);
        assert_eq!(styles.class_for(&NodeId::from("a")), Some("pc-1"));
        assert_eq!(styles.class_for(&NodeId::from("b")), Some("pc-2"));
        assert_eq!(styles.class_for(&NodeId::from("c")), Some("pc-1"));
        assert_eq!(styles.class_for(&NodeId::from("d")), None);
        assert_eq!(
            styles.classes[0].block.base,
            vec![Declaration::new("margin-top", "8px")]
        );
    }

    #[test]
    fn test_critical_follows_fold() {
        let registry = standard_registry();
        let d = doc(vec![
            node("a", "Spacer", json!({ "style": { "color": "red" } })),
            node("b", "Spacer", json!({ "style": { "color": "blue" } })),
            node("c", "Spacer", json!({ "style": { "color": "red" } })),
        ]);
        let styles = collect_styles(&d, &registry, "pc", 1).unwrap();

        assert!(styles.classes[0].critical);
        assert!(!styles.classes[1].critical);
    }

    #[test]
    fn test_hidden_top_level_does_not_count_toward_fold() {
        let registry = standard_registry();
        let mut hidden = node("a", "Spacer", json!({ "style": { "color": "red" } }));
        hidden.hidden = true;
        let d = doc(vec![
            hidden,
            node("b", "Spacer", json!({ "style": { "color": "blue" } })),
        ]);
        let styles = collect_styles(&d, &registry, "pc", 1).unwrap();

        assert_eq!(styles.classes.len(), 1);
        assert_eq!(styles.classes[0].name, "pc-1");
        assert!(styles.classes[0].critical);
        assert_eq!(styles.class_for(&NodeId::from("a")), None);
    }

    #[test]
    fn test_media_blocks() {
        let registry = standard_registry();
        let d = doc(vec![node(
            "a",
            "Spacer",
            json!({ "style": {
                "padding": 24,
                "@media  (max-width: 600px)": { "padding": 8 }
            } }),
        )]);
        let styles = collect_styles(&d, &registry, "pc", 3).unwrap();
        let class = &styles.classes[0];

        assert_eq!(
            class.block.media,
            vec![(
                "(max-width: 600px)".to_string(),
                vec![Declaration::new("padding", "8px")]
            )]
        );
        let media: Vec<_> = class.media_rules().collect();
        assert_eq!(media[0].media_query.as_deref(), Some("(max-width: 600px)"));
        assert_eq!(media[0].selector, ".pc-1");
    }

    #[test]
    fn test_invalid_style_is_reported() {
        let registry = standard_registry();
        let d = doc(vec![node("a", "Spacer", json!({ "style": { "color": [1, 2] } }))]);
        let err = collect_styles(&d, &registry, "pc", 3).unwrap_err();
        assert!(matches!(err, CompileError::InvalidStyle { ref prop, .. } if prop == "style"));
    }

    #[test]
    fn test_unknown_component_type() {
        let registry = standard_registry();
        let d = doc(vec![node("a", "Marquee", json!({}))]);
        assert_eq!(
            collect_styles(&d, &registry, "pc", 3),
            Err(CompileError::UnknownComponentType {
                node: NodeId::from("a"),
                component_type: "Marquee".into(),
            })
        );
    }
}
