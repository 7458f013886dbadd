//! Full HTML page around an exported fragment

use crate::compiler::escape_html;

/// Document shell settings
#[derive(Debug, Clone, PartialEq)]
pub struct PageShell {
    pub title: String,
    pub lang: String,

    /// Inlined in the head
    pub critical_css: String,

    /// Stylesheet loaded without blocking first paint
    pub deferred_href: Option<String>,
}

impl Default for PageShell {
    fn default() -> Self {
        Self {
            title: "Untitled page".to_string(),
            lang: "en".to_string(),
            critical_css: String::new(),
            deferred_href: None,
        }
    }
}

/// Wrap a markup fragment in a complete HTML document
pub fn compile_page(markup: &str, shell: &PageShell) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n");
    html.push_str(&format!("<html lang=\"{}\">\n", escape_html(&shell.lang)));
    html.push_str("<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str(&format!("<title>{}</title>\n", escape_html(&shell.title)));

    if !shell.critical_css.is_empty() {
        html.push_str("<style>");
        html.push_str(&escape_style_text(&shell.critical_css));
        html.push_str("</style>\n");
    }

    if let Some(href) = &shell.deferred_href {
        let href = escape_html(href);
        html.push_str(&format!(
            "<link rel=\"stylesheet\" href=\"{}\" media=\"print\" onload=\"this.media='all'\">\n",
            href
        ));
        html.push_str(&format!(
            "<noscript><link rel=\"stylesheet\" href=\"{}\"></noscript>\n",
            href
        ));
    }

    html.push_str("</head>\n");
    html.push_str("<body>\n");
    html.push_str(markup);
    if !markup.is_empty() && !markup.ends_with('\n') {
        html.push('\n');
    }
    html.push_str("</body>\n");
    html.push_str("</html>\n");
    html
}

/// Break up any `</style` (in any letter case) so inlined CSS cannot close
/// the element it sits in
fn escape_style_text(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(pos) = rest.find("</") {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);
        let closes_style = tail
            .get(2..7)
            .is_some_and(|name| name.eq_ignore_ascii_case("style"));
        out.push_str(if closes_style { "<\\/" } else { "</" });
        rest = &tail[2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_shell() {
        let shell = PageShell {
            title: "Tom & Jerry".into(),
            critical_css: ".pc-1{color:red}".into(),
            deferred_href: Some("deferred.css".into()),
            ..PageShell::default()
        };
        let html = compile_page("<p data-pc-id=\"a\">Hi</p>", &shell);

        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(html.contains("<title>Tom &amp; Jerry</title>"));
        assert!(html.contains("<style>.pc-1{color:red}</style>"));
        assert!(html.contains("href=\"deferred.css\" media=\"print\""));
        assert!(html.contains("<body>\n<p data-pc-id=\"a\">Hi</p>\n</body>"));
    }

    #[test]
    fn test_inlined_css_cannot_close_style_element() {
        for closing in ["</style>", "</STYLE>", "</StYlE >"] {
            let shell = PageShell {
                critical_css: format!(".pc-1{{height:1px{}<script>alert(1)</script>}}", closing),
                ..PageShell::default()
            };
            let html = compile_page("", &shell);

            let lower = html.to_ascii_lowercase();
            assert_eq!(lower.matches("</style").count(), 1, "{}", closing);
            assert!(lower.contains("<\\/style"));
            assert!(html.contains("</script>}</style>\n"));
        }
    }

    #[test]
    fn test_empty_styles_omitted() {
        let html = compile_page("", &PageShell::default());
        assert!(!html.contains("<style>"));
        assert!(!html.contains("<link"));
    }
}
