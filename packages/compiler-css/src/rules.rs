//! CSS rule model and text output

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)
    }
}

/// CSS rule with selector, ordered declarations and optional media query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
    pub media_query: Option<String>,
}

impl CssRule {
    pub fn new(selector: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            selector: selector.into(),
            declarations,
            media_query: None,
        }
    }

    pub fn in_media(mut self, query: impl Into<String>) -> Self {
        self.media_query = Some(query.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Set a declaration. An existing property keeps its position and takes
    /// the new value.
    pub fn set(&mut self, property: &str, value: &str) {
        match self
            .declarations
            .iter_mut()
            .find(|d| d.property == property)
        {
            Some(existing) => existing.value = value.to_string(),
            None => self.declarations.push(Declaration::new(property, value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }
}

/// How rule text is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CssFormat {
    /// One rule per line
    #[default]
    Compact,

    /// One declaration per line, indented
    Pretty,

    /// No optional whitespace at all
    Minified,
}

struct Writer {
    format: CssFormat,
    depth: usize,
    buffer: String,
}

impl Writer {
    fn new(format: CssFormat) -> Self {
        Self {
            format,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_indent(&mut self) {
        if self.format == CssFormat::Pretty {
            for _ in 0..self.depth {
                self.buffer.push_str("  ");
            }
        }
    }

    fn newline(&mut self) {
        if self.format != CssFormat::Minified {
            self.buffer.push('\n');
        }
    }

    fn open(&mut self, head: &str) {
        self.add_indent();
        self.add(head);
        match self.format {
            CssFormat::Minified => self.add("{"),
            CssFormat::Compact => self.add(" {"),
            CssFormat::Pretty => {
                self.add(" {");
                self.newline();
            }
        }
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        match self.format {
            CssFormat::Minified => self.add("}"),
            CssFormat::Compact => {
                self.add(" }");
                self.newline();
            }
            CssFormat::Pretty => {
                self.add_indent();
                self.add("}");
                self.newline();
            }
        }
    }

    fn declarations(&mut self, declarations: &[Declaration]) {
        match self.format {
            CssFormat::Minified => {
                let body = declarations
                    .iter()
                    .map(|d| format!("{}:{}", d.property, d.value))
                    .collect::<Vec<_>>()
                    .join(";");
                self.add(&body);
            }
            CssFormat::Compact => {
                for d in declarations {
                    self.add(&format!(" {};", d));
                }
            }
            CssFormat::Pretty => {
                for d in declarations {
                    self.add_indent();
                    self.add(&format!("{};", d));
                    self.newline();
                }
            }
        }
    }

    fn rule(&mut self, rule: &CssRule) {
        self.open(&rule.selector);
        self.declarations(&rule.declarations);
        self.close();
    }
}

/// Convert rules to CSS text.
///
/// Consecutive rules sharing a media query are emitted inside one
/// `@media` block.
pub fn to_css(rules: &[CssRule], format: CssFormat) -> String {
    let mut writer = Writer::new(format);
    let mut i = 0;

    while i < rules.len() {
        match &rules[i].media_query {
            None => {
                writer.rule(&rules[i]);
                i += 1;
            }
            Some(query) => {
                let head = match format {
                    CssFormat::Minified => format!("@media {}", query.replace(": ", ":")),
                    _ => format!("@media {}", query),
                };
                writer.open(&head);
                while i < rules.len() && rules[i].media_query.as_ref() == Some(query) {
                    if format == CssFormat::Compact {
                        writer.add(" ");
                        writer.add(&rules[i].selector);
                        writer.add(" {");
                        writer.declarations(&rules[i].declarations);
                        writer.add(" }");
                    } else {
                        writer.rule(&rules[i]);
                    }
                    i += 1;
                }
                writer.close();
            }
        }
    }

    writer.buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CssRule> {
        vec![
            CssRule::new(
                ".pc-1",
                vec![
                    Declaration::new("color", "red"),
                    Declaration::new("padding", "8px"),
                ],
            ),
            CssRule::new(".pc-1", vec![Declaration::new("padding", "4px")])
                .in_media("(max-width: 600px)"),
        ]
    }

    #[test]
    fn test_compact_output() {
        assert_eq!(
            to_css(&sample(), CssFormat::Compact),
            ".pc-1 { color: red; padding: 8px; }\n\
             @media (max-width: 600px) { .pc-1 { padding: 4px; } }\n"
        );
    }

    #[test]
    fn test_pretty_output() {
        assert_eq!(
            to_css(&sample(), CssFormat::Pretty),
            ".pc-1 {\n  color: red;\n  padding: 8px;\n}\n\
             @media (max-width: 600px) {\n  .pc-1 {\n    padding: 4px;\n  }\n}\n"
        );
    }

    #[test]
    fn test_minified_output() {
        assert_eq!(
            to_css(&sample(), CssFormat::Minified),
            ".pc-1{color:red;padding:8px}@media (max-width:600px){.pc-1{padding:4px}}"
        );
    }

    #[test]
    fn test_set_overrides_in_place() {
        let mut rule = sample().remove(0);
        rule.set("color", "blue");
        rule.set("margin", "0");
        assert_eq!(rule.get("color"), Some("blue"));
        assert_eq!(rule.declarations[0].property, "color");
        assert_eq!(rule.declarations[2].property, "margin");
    }
}
