use pagecraft_document::{Document, Node, NodeId};
use pagecraft_schema::{PropSpec, PropValue, Schema, SchemaRegistry};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors that can occur during HTML compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Node '{node}' has unknown component type '{component_type}'")]
    UnknownComponentType {
        node: NodeId,
        component_type: String,
    },

    #[error("Node '{0}' is referenced but missing from the document")]
    MissingNode(NodeId),
}

/// Options for HTML compilation
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Pretty print HTML
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: "  ".to_string(),
        }
    }
}

impl CompileOptions {
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }
}

struct Context {
    options: CompileOptions,
    depth: usize,
    buffer: String,
}

impl Context {
    fn new(options: CompileOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        self.newline();
    }

    fn add_indent(&mut self) {
        if !self.options.pretty {
            return;
        }
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn newline(&mut self) {
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Compile the visible part of a page to an HTML fragment
pub fn compile_to_html(
    doc: &Document,
    registry: &SchemaRegistry,
    options: CompileOptions,
) -> Result<String, CompileError> {
    HtmlCompiler::new(registry, options).compile(doc)
}

/// Markup pass of the export.
///
/// Every visible node becomes its schema tag carrying `data-pc-id`, its
/// generated class (when one is supplied) and the props declared as HTML
/// attributes. Hidden nodes and everything below them are skipped.
/// Containers with more than one zone wrap each zone in a
/// `data-pc-zone` element so layouts can target them.
pub struct HtmlCompiler<'a> {
    registry: &'a SchemaRegistry,
    options: CompileOptions,
    classes: Option<&'a BTreeMap<NodeId, String>>,
    asset_urls: Option<&'a HashMap<String, String>>,
}

impl<'a> HtmlCompiler<'a> {
    pub fn new(registry: &'a SchemaRegistry, options: CompileOptions) -> Self {
        Self {
            registry,
            options,
            classes: None,
            asset_urls: None,
        }
    }

    /// Node id -> class name, as generated by the style pass
    pub fn with_classes(mut self, classes: &'a BTreeMap<NodeId, String>) -> Self {
        self.classes = Some(classes);
        self
    }

    /// Original asset URL -> URL to emit instead
    pub fn with_asset_urls(mut self, asset_urls: &'a HashMap<String, String>) -> Self {
        self.asset_urls = Some(asset_urls);
        self
    }

    #[instrument(skip(self, doc), fields(nodes = doc.len()))]
    pub fn compile(&self, doc: &Document) -> Result<String, CompileError> {
        let mut ctx = Context::new(self.options.clone());
        for id in doc.root_children() {
            let node = doc
                .node(id)
                .ok_or_else(|| CompileError::MissingNode(id.clone()))?;
            self.compile_node(doc, node, &mut ctx)?;
        }
        let html = ctx.get_output();
        debug!(bytes = html.len(), "Markup compiled");
        Ok(html)
    }

    fn compile_node(
        &self,
        doc: &Document,
        node: &Node,
        ctx: &mut Context,
    ) -> Result<(), CompileError> {
        if node.hidden {
            return Ok(());
        }
        let schema = self.registry.get(&node.component_type).ok_or_else(|| {
            CompileError::UnknownComponentType {
                node: node.id.clone(),
                component_type: node.component_type.clone(),
            }
        })?;
        let tag = schema.tag.as_str();

        // Opening tag
        ctx.add_indent();
        ctx.add(&format!("<{}", tag));
        ctx.add(&format!(" data-pc-id=\"{}\"", escape_html(node.id.as_str())));
        if let Some(class) = self.classes.and_then(|classes| classes.get(&node.id)) {
            ctx.add(&format!(" class=\"{}\"", escape_html(class)));
        }
        for (name, spec) in &schema.props {
            let Some(attribute) = spec.attribute.as_deref() else {
                continue;
            };
            if let Some(value) = self.attribute_value(node, name, spec) {
                ctx.add(&format!(" {}=\"{}\"", attribute, escape_html(&value)));
            }
        }

        // Self-closing tags
        if is_self_closing(tag) {
            ctx.add(" />");
            ctx.newline();
            return Ok(());
        }
        ctx.add(">");

        let text = text_content(node, schema);
        let zones = self.zone_children(doc, node, schema)?;
        let has_element_children = zones
            .iter()
            .any(|(zone, children)| zone.is_some() || !children.is_empty());

        if !has_element_children {
            if let Some(text) = &text {
                ctx.add(&escape_html(text));
            }
            ctx.add(&format!("</{}>", tag));
            ctx.newline();
            return Ok(());
        }

        ctx.newline();
        ctx.indent();
        if let Some(text) = &text {
            ctx.add_line(&escape_html(text));
        }
        for (zone, children) in zones {
            match zone {
                Some(zone) => {
                    ctx.add_line(&format!("<div data-pc-zone=\"{}\">", escape_html(zone)));
                    ctx.indent();
                    for child in children {
                        self.compile_node(doc, child, ctx)?;
                    }
                    ctx.dedent();
                    ctx.add_line("</div>");
                }
                None => {
                    for child in children {
                        self.compile_node(doc, child, ctx)?;
                    }
                }
            }
        }
        ctx.dedent();

        // Closing tag
        ctx.add_line(&format!("</{}>", tag));
        Ok(())
    }

    /// Visible children grouped by zone. Single-zone containers yield one
    /// unnamed group so no wrapper is emitted.
    fn zone_children<'d>(
        &self,
        doc: &'d Document,
        node: &Node,
        schema: &'a Schema,
    ) -> Result<Vec<(Option<&'a str>, Vec<&'d Node>)>, CompileError> {
        let mut visible = Vec::with_capacity(node.children.len());
        for id in &node.children {
            let child = doc
                .node(id)
                .ok_or_else(|| CompileError::MissingNode(id.clone()))?;
            if !child.hidden {
                visible.push(child);
            }
        }

        if schema.zones.len() <= 1 {
            return Ok(vec![(None, visible)]);
        }

        Ok(schema
            .zones
            .keys()
            .map(|zone| {
                let children = visible
                    .iter()
                    .copied()
                    .filter(|child| {
                        child.zone_id.as_deref().or(schema.default_zone.as_deref())
                            == Some(zone.as_str())
                    })
                    .collect();
                (Some(zone.as_str()), children)
            })
            .collect())
    }

    fn attribute_value(&self, node: &Node, name: &str, spec: &PropSpec) -> Option<String> {
        let value = match node.prop(name) {
            Some(PropValue::Null) | None if spec.has_default() => &spec.default,
            Some(PropValue::Null) | None => return None,
            Some(value) => value,
        };
        let text = match value {
            PropValue::String(s) if s.is_empty() => return None,
            PropValue::String(s) => s.clone(),
            PropValue::Number(n) => n.to_string(),
            PropValue::Bool(b) => b.to_string(),
            _ => return None,
        };

        if spec.asset.is_some() {
            if let Some(rewritten) = self.asset_urls.and_then(|urls| urls.get(&text)) {
                return Some(rewritten.clone());
            }
        }
        Some(text)
    }
}

fn text_content(node: &Node, schema: &Schema) -> Option<String> {
    let prop = schema.text_prop.as_deref()?;
    let value = match node.prop(prop) {
        Some(PropValue::Null) | None => schema.props.get(prop).map(|spec| &spec.default)?,
        Some(value) => value,
    };
    match value {
        PropValue::String(s) if !s.is_empty() => Some(s.clone()),
        PropValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn is_self_closing(tag: &str) -> bool {
    matches!(
        tag,
        "img"
            | "input"
            | "br"
            | "hr"
            | "meta"
            | "link"
            | "area"
            | "base"
            | "col"
            | "embed"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
