use pagecraft_compiler_css::StyleOptions;
use pagecraft_compiler_html::CompileOptions;
use serde::{Deserialize, Serialize};

/// Export settings, read from the `export` section of the project config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Visible top-level children whose styles are inlined as critical
    pub fold_count: usize,
    pub minify: bool,
    pub pretty: bool,
    pub class_prefix: String,

    /// Prefix for relative asset URLs, e.g. a CDN origin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_base_url: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            fold_count: 3,
            minify: true,
            pretty: false,
            class_prefix: "pc".to_string(),
            asset_base_url: None,
        }
    }
}

impl ExportOptions {
    pub fn style_options(&self) -> StyleOptions {
        StyleOptions {
            class_prefix: self.class_prefix.clone(),
            fold_count: self.fold_count,
            minify: self.minify,
            pretty: self.pretty,
        }
    }

    pub fn html_options(&self) -> CompileOptions {
        CompileOptions {
            pretty: self.pretty,
            ..CompileOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let options: ExportOptions =
            serde_json::from_str(r#"{ "foldCount": 1, "assetBaseUrl": "https://cdn.example.com" }"#)
                .unwrap();
        assert_eq!(options.fold_count, 1);
        assert!(options.minify);
        assert_eq!(options.class_prefix, "pc");
        assert_eq!(options.asset_base_url.as_deref(), Some("https://cdn.example.com"));
        assert_eq!(options.style_options().fold_count, 1);
    }
}
