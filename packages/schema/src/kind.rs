//! Prop kinds and value validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A prop value. Props are opaque JSON values; the schema only checks
/// their shape against a [`PropKind`].
pub type PropValue = serde_json::Value;

/// A node's property bag. Ordered so that exports are deterministic.
pub type Props = BTreeMap<String, PropValue>;

/// The declared shape of a prop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "camelCase")]
pub enum PropKind {
    Text,
    Number,
    Boolean,
    Color,
    Url,
    Enum(Vec<String>),
    /// CSS declarations: `{ "color": "red", "@media (max-width: 600px)": { ... } }`
    Style,
    Any,
}

impl PropKind {
    /// Check a value against this kind, returning the reason on mismatch.
    pub fn check(&self, value: &PropValue) -> Result<(), String> {
        match self {
            PropKind::Any => Ok(()),
            PropKind::Text | PropKind::Url => match value {
                PropValue::String(_) => Ok(()),
                other => Err(format!("expected string, got {}", type_name(other))),
            },
            PropKind::Number => match value {
                PropValue::Number(_) => Ok(()),
                other => Err(format!("expected number, got {}", type_name(other))),
            },
            PropKind::Boolean => match value {
                PropValue::Bool(_) => Ok(()),
                other => Err(format!("expected boolean, got {}", type_name(other))),
            },
            PropKind::Color => match value {
                PropValue::String(s) if is_color(s) => Ok(()),
                PropValue::String(s) => Err(format!("'{}' is not a color", s)),
                other => Err(format!("expected color string, got {}", type_name(other))),
            },
            PropKind::Enum(values) => match value {
                PropValue::String(s) if values.iter().any(|v| v == s) => Ok(()),
                PropValue::String(s) => Err(format!(
                    "'{}' is not one of [{}]",
                    s,
                    values.join(", ")
                )),
                other => Err(format!("expected enum string, got {}", type_name(other))),
            },
            PropKind::Style => check_style(value, true),
        }
    }

    pub fn accepts(&self, value: &PropValue) -> bool {
        self.check(value).is_ok()
    }
}

fn check_style(value: &PropValue, allow_media: bool) -> Result<(), String> {
    let map = match value {
        PropValue::Object(map) => map,
        other => return Err(format!("expected style object, got {}", type_name(other))),
    };

    for (property, declared) in map {
        if !is_safe_css_text(property) {
            return Err(format!("style key '{}' contains forbidden characters", property));
        }
        match declared {
            PropValue::String(s) if !is_safe_css_text(s) => {
                return Err(format!(
                    "style property '{}' has a value with forbidden characters",
                    property
                ))
            }
            PropValue::String(_) | PropValue::Number(_) => {}
            PropValue::Object(_) if allow_media && property.starts_with("@media") => {
                check_style(declared, false)?;
            }
            other => {
                return Err(format!(
                    "style property '{}' has unsupported {} value",
                    property,
                    type_name(other)
                ))
            }
        }
    }

    Ok(())
}

/// Style keys, values and media queries are emitted as raw CSS text, so
/// none of them may open or close a block, end a declaration or start a
/// markup tag.
pub fn is_safe_css_text(s: &str) -> bool {
    !s.chars()
        .any(|c| matches!(c, '{' | '}' | ';' | '<') || c.is_control())
}

fn is_color(s: &str) -> bool {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if ["rgb(", "rgba(", "hsl(", "hsla(", "var("]
        .iter()
        .any(|prefix| s.starts_with(prefix))
    {
        return s.ends_with(')');
    }
    // Named colors and keywords like `transparent` / `currentColor`
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())
}

fn type_name(value: &PropValue) -> &'static str {
    match value {
        PropValue::Null => "null",
        PropValue::Bool(_) => "boolean",
        PropValue::Number(_) => "number",
        PropValue::String(_) => "string",
        PropValue::Array(_) => "array",
        PropValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_kinds() {
        assert!(PropKind::Text.accepts(&json!("hello")));
        assert!(!PropKind::Text.accepts(&json!(3)));
        assert!(PropKind::Number.accepts(&json!(3.5)));
        assert!(!PropKind::Number.accepts(&json!("3")));
        assert!(PropKind::Boolean.accepts(&json!(true)));
        assert!(PropKind::Any.accepts(&json!([1, 2])));
    }

    #[test]
    fn test_color_kind() {
        assert!(PropKind::Color.accepts(&json!("#fff")));
        assert!(PropKind::Color.accepts(&json!("#3366FFAA")));
        assert!(PropKind::Color.accepts(&json!("rgba(0, 0, 0, 0.5)")));
        assert!(PropKind::Color.accepts(&json!("transparent")));
        assert!(!PropKind::Color.accepts(&json!("#12")));
        assert!(!PropKind::Color.accepts(&json!("not a color")));
    }

    #[test]
    fn test_enum_kind_reports_choices() {
        let kind = PropKind::Enum(vec!["h1".into(), "h2".into()]);
        assert!(kind.accepts(&json!("h2")));

        let err = kind.check(&json!("h7")).unwrap_err();
        assert!(err.contains("h1, h2"));
    }

    #[test]
    fn test_style_kind() {
        assert!(PropKind::Style.accepts(&json!({
            "color": "red",
            "padding": 8,
            "@media (max-width: 600px)": { "padding": 4 }
        })));

        // Nested media queries are not supported
        assert!(!PropKind::Style.accepts(&json!({
            "@media print": { "@media screen": { "color": "red" } }
        })));
        assert!(!PropKind::Style.accepts(&json!({ "color": true })));
        assert!(!PropKind::Style.accepts(&json!("color: red")));
    }

    #[test]
    fn test_style_rejects_rule_breaking_text() {
        assert!(!PropKind::Style.accepts(&json!({ "color": "red}body{display:none" })));
        assert!(!PropKind::Style.accepts(&json!({ "height": "1px</STYLE><script>" })));
        assert!(!PropKind::Style.accepts(&json!({ "color": "red; margin: 0" })));
        assert!(!PropKind::Style.accepts(&json!({ "color": "red\nblue" })));
        assert!(!PropKind::Style.accepts(&json!({ "co{lor": "red" })));
        assert!(!PropKind::Style.accepts(&json!({
            "@media print{body{display:none}}": { "color": "red" }
        })));
        assert!(!PropKind::Style.accepts(&json!({
            "@media print": { "color": "red}" }
        })));

        assert!(PropKind::Style.accepts(&json!({
            "fontFamily": "\"Helvetica Neue\", sans-serif",
            "background": "url(/img/hero.png) no-repeat"
        })));
    }
}
