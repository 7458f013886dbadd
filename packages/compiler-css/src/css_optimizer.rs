//! CSS optimizer - merges rules that share a selector and media query

use crate::rules::CssRule;

/// Optimize a list of CSS rules by:
/// 1. Merging rules with the same selector + media query into the first one
/// 2. Letting later declarations override earlier ones
/// 3. Removing empty rules
///
/// Relative order of the surviving rules is kept, so output stays
/// deterministic.
pub fn optimize_css_rules(rules: Vec<CssRule>) -> Vec<CssRule> {
    let mut optimized: Vec<CssRule> = Vec::with_capacity(rules.len());

    for rule in rules {
        let existing = optimized
            .iter_mut()
            .find(|r| r.selector == rule.selector && r.media_query == rule.media_query);
        match existing {
            Some(target) => {
                for declaration in &rule.declarations {
                    target.set(&declaration.property, &declaration.value);
                }
            }
            None => optimized.push(rule),
        }
    }

    optimized.retain(|rule| !rule.is_empty());
    optimized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Declaration;

    fn rule(selector: &str, declarations: &[(&str, &str)]) -> CssRule {
        CssRule::new(
            selector,
            declarations
                .iter()
                .map(|(p, v)| Declaration::new(*p, *v))
                .collect(),
        )
    }

    #[test]
    fn test_deduplicate_identical_rules() {
        let optimized = optimize_css_rules(vec![
            rule(".foo", &[("color", "red")]),
            rule(".foo", &[("color", "red")]),
        ]);
        assert_eq!(optimized, vec![rule(".foo", &[("color", "red")])]);
    }

    #[test]
    fn test_merge_same_selector() {
        let optimized = optimize_css_rules(vec![
            rule(".foo", &[("color", "red")]),
            rule(".bar", &[("margin", "0")]),
            rule(".foo", &[("background", "blue"), ("color", "green")]),
        ]);
        assert_eq!(
            optimized,
            vec![
                rule(".foo", &[("color", "green"), ("background", "blue")]),
                rule(".bar", &[("margin", "0")]),
            ]
        );
    }

    #[test]
    fn test_media_query_keeps_rules_apart() {
        let optimized = optimize_css_rules(vec![
            rule(".foo", &[("color", "red")]),
            rule(".foo", &[("color", "blue")]).in_media("(max-width: 600px)"),
        ]);
        assert_eq!(optimized.len(), 2);
    }

    #[test]
    fn test_empty_rules_removed() {
        let optimized = optimize_css_rules(vec![rule(".foo", &[]), rule(".bar", &[("color", "red")])]);
        assert_eq!(optimized.len(), 1);
        assert_eq!(optimized[0].selector, ".bar");
    }
}
