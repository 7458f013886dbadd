//! # Pagecraft CSS Compiler
//!
//! Style pass of the page export.
//!
//! ```text
//! Document ─▶ collect_styles ─▶ split_css_rules ─▶ optimize ─▶ minify ─▶ to_css
//!               (classes)        (critical/deferred)
//! ```
//!
//! The generated class for each node is exposed through
//! [`CompiledStyles::class_for`] so the markup pass can reference it.

mod collector;
mod css_minifier;
mod css_optimizer;
mod css_splitter;
mod error;
mod rules;

pub use collector::{
    collect_styles, format_value, is_unitless, to_kebab_case, CollectedStyles, StyleBlock,
    StyleClass,
};
pub use css_minifier::{minify_css_rules, minify_css_value};
pub use css_optimizer::optimize_css_rules;
pub use css_splitter::{split_css_rules, SplitCss};
pub use error::{CompileError, CompileResult};
pub use rules::{to_css, CssFormat, CssRule, Declaration};

use pagecraft_document::{Document, NodeId};
use pagecraft_schema::SchemaRegistry;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Options for the style pass
#[derive(Debug, Clone, PartialEq)]
pub struct StyleOptions {
    pub class_prefix: String,

    /// Number of visible top-level children treated as above the fold
    pub fold_count: usize,
    pub minify: bool,
    pub pretty: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            class_prefix: "pc".to_string(),
            fold_count: 3,
            minify: true,
            pretty: false,
        }
    }
}

impl StyleOptions {
    fn format(&self) -> CssFormat {
        if self.pretty {
            CssFormat::Pretty
        } else if self.minify {
            CssFormat::Minified
        } else {
            CssFormat::Compact
        }
    }
}

/// Output of the style pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledStyles {
    pub critical: String,
    pub deferred: String,

    /// Node id -> generated class name
    pub classes: BTreeMap<NodeId, String>,
}

impl CompiledStyles {
    pub fn class_for(&self, id: &NodeId) -> Option<&str> {
        self.classes.get(id).map(String::as_str)
    }
}

/// Compile the styles of a page into critical and deferred CSS
#[instrument(skip(doc, registry, options), fields(nodes = doc.len(), fold = options.fold_count))]
pub fn compile_styles(
    doc: &Document,
    registry: &SchemaRegistry,
    options: &StyleOptions,
) -> CompileResult<CompiledStyles> {
    let styles = collect_styles(doc, registry, &options.class_prefix, options.fold_count)?;
    let split = split_css_rules(&styles);
    debug!(rules = split.total_rules(), "Styles split");

    let mut critical = optimize_css_rules(split.critical);
    let mut deferred = optimize_css_rules(split.deferred);
    if options.minify {
        minify_css_rules(&mut critical);
        minify_css_rules(&mut deferred);
    }

    let format = options.format();
    let compiled = CompiledStyles {
        critical: to_css(&critical, format),
        deferred: to_css(&deferred, format),
        classes: styles.assignments,
    };

    info!(
        classes = styles.classes.len(),
        critical_rules = critical.len(),
        deferred_rules = deferred.len(),
        "CSS compilation complete"
    );
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_document::Node;
    use pagecraft_schema::{standard_registry, Props};
    use serde_json::json;

    fn spacer(id: &str, style: serde_json::Value) -> Node {
        Node::new(NodeId::from(id), "Spacer")
            .with_props(serde_json::from_value::<Props>(json!({ "style": style })).unwrap())
    }

    fn page() -> Document {
        let nodes = vec![
            spacer("a", json!({ "padding": 0, "color": "#ffffff" })),
            spacer("b", json!({ "color": "red", "@media (max-width: 600px)": { "color": "blue" } })),
        ];
        let roots = nodes.iter().map(|n| n.id.clone()).collect();
        Document::from_parts(roots, nodes)
    }

    #[test]
    fn test_compile_minified() {
        let options = StyleOptions {
            fold_count: 1,
            ..StyleOptions::default()
        };
        let styles = compile_styles(&page(), &standard_registry(), &options).unwrap();

        assert_eq!(styles.critical, ".pc-1{color:#fff;padding:0}");
        assert_eq!(
            styles.deferred,
            ".pc-2{color:red}@media (max-width:600px){.pc-2{color:blue}}"
        );
        assert_eq!(styles.class_for(&NodeId::from("b")), Some("pc-2"));
    }

    #[test]
    fn test_compile_pretty_keeps_values() {
        let options = StyleOptions {
            pretty: true,
            minify: false,
            ..StyleOptions::default()
        };
        let styles = compile_styles(&page(), &standard_registry(), &options).unwrap();

        assert!(styles.critical.contains("  color: #ffffff;\n"));
        assert!(styles.critical.contains(".pc-2 {\n  color: red;\n}\n"));
        assert!(styles.deferred.starts_with("@media (max-width: 600px) {\n"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let registry = standard_registry();
        let options = StyleOptions::default();
        let first = compile_styles(&page(), &registry, &options).unwrap();
        let second = compile_styles(&page(), &registry, &options).unwrap();
        assert_eq!(first, second);
    }
}
