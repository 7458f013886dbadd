//! CSS minification - compress declaration values for smaller payloads

use crate::rules::CssRule;

const ZERO_UNITS: &[&str] = &["px", "em", "rem", "vh", "vw", "pt"];

/// Minify a single CSS value
pub fn minify_css_value(value: &str) -> String {
    value
        .split_whitespace()
        .map(minify_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn minify_token(token: &str) -> String {
    let (body, trailing_comma) = match token.strip_suffix(',') {
        Some(body) => (body, ","),
        None => (token, ""),
    };

    let minified = if is_zero_length(body) {
        "0".to_string()
    } else if let Some(short) = short_hex(body) {
        short
    } else {
        body.to_string()
    };

    format!("{}{}", minified, trailing_comma)
}

fn is_zero_length(token: &str) -> bool {
    ZERO_UNITS.iter().any(|unit| {
        token
            .strip_suffix(unit)
            .is_some_and(|number| !number.is_empty() && number.parse::<f64>().ok() == Some(0.0))
    })
}

/// `#ffcc00` -> `#fc0`
fn short_hex(token: &str) -> Option<String> {
    let hex = token.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let bytes = hex.to_ascii_lowercase().into_bytes();
    if bytes[0] == bytes[1] && bytes[2] == bytes[3] && bytes[4] == bytes[5] {
        Some(format!(
            "#{}{}{}",
            bytes[0] as char, bytes[2] as char, bytes[4] as char
        ))
    } else {
        None
    }
}

/// Minify declaration values and media queries in place. Selectors are
/// generated class names and are left alone.
pub fn minify_css_rules(rules: &mut [CssRule]) {
    for rule in rules.iter_mut() {
        for declaration in rule.declarations.iter_mut() {
            declaration.value = minify_css_value(&declaration.value);
        }

        if let Some(ref mut mq) = rule.media_query {
            *mq = mq.split_whitespace().collect::<Vec<_>>().join(" ");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Declaration;

    #[test]
    fn test_minify_zero_values() {
        assert_eq!(minify_css_value("0px"), "0");
        assert_eq!(minify_css_value("0em"), "0");
        assert_eq!(minify_css_value("0.0rem"), "0");
        assert_eq!(minify_css_value("0px 10px 0px 20px"), "0 10px 0 20px");
        assert_eq!(minify_css_value("10px"), "10px");
        assert_eq!(minify_css_value("100px"), "100px");
    }

    #[test]
    fn test_minify_colors() {
        assert_eq!(minify_css_value("#ffffff"), "#fff");
        assert_eq!(minify_css_value("#000000"), "#000");
        assert_eq!(minify_css_value("#AABBCC"), "#abc");
        assert_eq!(minify_css_value("#123456"), "#123456");
    }

    #[test]
    fn test_remove_whitespace() {
        assert_eq!(minify_css_value("  10px  20px  "), "10px 20px");
        // calc needs the spaces around operators
        assert_eq!(minify_css_value("calc(100%  -  20px)"), "calc(100% - 20px)");
        assert_eq!(
            minify_css_value("0px 1px 2px #000000, 0px 0px 4px red"),
            "0 1px 2px #000, 0 0 4px red"
        );
    }

    #[test]
    fn test_minify_rules() {
        let mut rules = vec![CssRule::new(
            ".pc-1",
            vec![
                Declaration::new("padding", "0px"),
                Declaration::new("margin", "10px  20px"),
                Declaration::new("color", "#ffffff"),
            ],
        )
        .in_media("(max-width:   600px)")];

        minify_css_rules(&mut rules);

        assert_eq!(rules[0].selector, ".pc-1");
        assert_eq!(rules[0].get("padding"), Some("0"));
        assert_eq!(rules[0].get("margin"), Some("10px 20px"));
        assert_eq!(rules[0].get("color"), Some("#fff"));
        assert_eq!(rules[0].media_query.as_deref(), Some("(max-width: 600px)"));
    }
}
