//! # Export Bundle
//!
//! Assembles the output of one export pass:
//!
//! ```text
//! Document ─▶ check_invariants ─▶ compile_styles ─▶ HtmlCompiler ─▶ ExportBundle
//!                                   (classes) ──────────▲
//!                                 collect_assets ───────┘
//! ```
//!
//! The bundle shape is what page delivery consumes:
//! `{ markup, criticalStyles, deferredStyles, assets }`.

use crate::error::{ExportError, ExportResult};
use crate::options::ExportOptions;
use pagecraft_compiler_css::compile_styles;
use pagecraft_compiler_html::{collect_assets, AssetRef, HtmlCompiler};
use pagecraft_document::{check_invariants, Document};
use pagecraft_schema::SchemaRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub markup: String,
    pub critical_styles: String,
    pub deferred_styles: String,
    pub assets: Vec<AssetRef>,
}

impl ExportBundle {
    pub fn asset(&self, id: &str) -> Option<&AssetRef> {
        self.assets.iter().find(|asset| asset.id == id)
    }

    /// Total size of the text outputs in bytes
    pub fn size(&self) -> usize {
        self.markup.len() + self.critical_styles.len() + self.deferred_styles.len()
    }
}

/// Compile a page without touching its assets
pub fn compile_bundle(
    doc: &Document,
    registry: &SchemaRegistry,
    options: &ExportOptions,
) -> ExportResult<ExportBundle> {
    let assets = collect_assets(doc, registry);
    compile_with_assets(doc, registry, options, assets, &HashMap::new())
}

/// Shared tail of both export paths. `asset_urls` maps original URLs to
/// the ones the markup should reference.
#[instrument(skip_all, fields(nodes = doc.len(), assets = assets.len()))]
pub(crate) fn compile_with_assets(
    doc: &Document,
    registry: &SchemaRegistry,
    options: &ExportOptions,
    assets: Vec<AssetRef>,
    asset_urls: &HashMap<String, String>,
) -> ExportResult<ExportBundle> {
    let violations = check_invariants(doc, registry);
    if !violations.is_empty() {
        return Err(ExportError::InvalidDocument(violations));
    }

    let styles = compile_styles(doc, registry, &options.style_options())?;
    let markup = HtmlCompiler::new(registry, options.html_options())
        .with_classes(&styles.classes)
        .with_asset_urls(asset_urls)
        .compile(doc)?;

    let bundle = ExportBundle {
        markup,
        critical_styles: styles.critical,
        deferred_styles: styles.deferred,
        assets,
    };

    info!(
        markup_bytes = bundle.markup.len(),
        critical_bytes = bundle.critical_styles.len(),
        deferred_bytes = bundle.deferred_styles.len(),
        "Export complete"
    );
    Ok(bundle)
}
