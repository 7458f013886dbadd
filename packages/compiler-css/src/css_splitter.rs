//! CSS splitting - separate above-the-fold styles from the rest

use crate::collector::CollectedStyles;
use crate::rules::CssRule;

/// Rules split by load priority
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitCss {
    /// Needed to paint the first top-level children; inlined in the page
    pub critical: Vec<CssRule>,

    /// Everything else, including every media-query rule
    pub deferred: Vec<CssRule>,
}

impl SplitCss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_rules(&self) -> usize {
        self.critical.len() + self.deferred.len()
    }
}

/// Split collected classes into critical and deferred rules.
///
/// Each declaration block lands in exactly one of the two lists. Deferred
/// media rules follow all deferred base rules, grouped by query in order of
/// first appearance.
pub fn split_css_rules(styles: &CollectedStyles) -> SplitCss {
    let mut split = SplitCss::new();
    let mut media: Vec<CssRule> = Vec::new();

    for class in &styles.classes {
        if let Some(rule) = class.base_rule() {
            if class.critical {
                split.critical.push(rule);
            } else {
                split.deferred.push(rule);
            }
        }
        media.extend(class.media_rules());
    }

    let mut queries: Vec<&str> = Vec::new();
    for rule in &media {
        if let Some(query) = rule.media_query.as_deref() {
            if !queries.contains(&query) {
                queries.push(query);
            }
        }
    }
    let mut ordered: Vec<(usize, CssRule)> = media
        .iter()
        .map(|rule| {
            let position = queries
                .iter()
                .position(|q| Some(*q) == rule.media_query.as_deref())
                .unwrap_or(queries.len());
            (position, rule.clone())
        })
        .collect();
    ordered.sort_by_key(|(position, _)| *position);

    split.deferred.extend(ordered.into_iter().map(|(_, rule)| rule));
    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{StyleBlock, StyleClass};
    use crate::rules::Declaration;

    fn class(name: &str, critical: bool, media: &[&str]) -> StyleClass {
        StyleClass {
            name: name.to_string(),
            block: StyleBlock {
                base: vec![Declaration::new("color", "red")],
                media: media
                    .iter()
                    .map(|q| (q.to_string(), vec![Declaration::new("color", "blue")]))
                    .collect(),
            },
            critical,
        }
    }

    #[test]
    fn test_media_rules_are_always_deferred() {
        let styles = CollectedStyles {
            classes: vec![class("pc-1", true, &["(max-width: 600px)"])],
            ..CollectedStyles::default()
        };
        let split = split_css_rules(&styles);

        assert_eq!(split.critical.len(), 1);
        assert!(split.critical[0].media_query.is_none());
        assert_eq!(split.deferred.len(), 1);
        assert_eq!(
            split.deferred[0].media_query.as_deref(),
            Some("(max-width: 600px)")
        );
    }

    #[test]
    fn test_deferred_media_grouped_by_query() {
        let styles = CollectedStyles {
            classes: vec![
                class("pc-1", false, &["(a)", "(b)"]),
                class("pc-2", false, &["(a)"]),
            ],
            ..CollectedStyles::default()
        };
        let split = split_css_rules(&styles);
        let order: Vec<_> = split
            .deferred
            .iter()
            .map(|r| (r.selector.as_str(), r.media_query.as_deref()))
            .collect();

        assert!(split.critical.is_empty());
        assert_eq!(
            order,
            vec![
                (".pc-1", None),
                (".pc-2", None),
                (".pc-1", Some("(a)")),
                (".pc-2", Some("(a)")),
                (".pc-1", Some("(b)")),
            ]
        );
        assert_eq!(split.total_rules(), 5);
    }
}
