//! # Asset Optimization
//!
//! The only asynchronous part of the export. Optimizers may fetch, encode
//! or upload assets; all of them run concurrently over the manifest.
//!
//! The export works on its own copy of the document, taken before the first
//! await point. Edits made while optimizers are running only show up in the
//! next export.

use crate::bundle::{compile_bundle, compile_with_assets, ExportBundle};
use crate::error::ExportResult;
use crate::options::ExportOptions;
use async_trait::async_trait;
use futures::future::try_join_all;
use pagecraft_compiler_html::{collect_assets, AssetRef};
use pagecraft_document::Document;
use pagecraft_schema::SchemaRegistry;
use std::collections::HashMap;
use tracing::{debug, instrument};

#[async_trait]
pub trait AssetOptimizer: Send + Sync {
    /// Process one asset and return the URL the page should use for it
    async fn optimize(&self, asset: &AssetRef) -> ExportResult<String>;
}

/// Prefixes relative asset URLs with a base URL
#[derive(Debug, Clone, PartialEq)]
pub struct CdnRewriter {
    base_url: String,
}

impl CdnRewriter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn rewrite(&self, url: &str) -> String {
        if is_absolute(url) {
            return url.to_string();
        }
        let path = url.trim_start_matches("./").trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl AssetOptimizer for CdnRewriter {
    async fn optimize(&self, asset: &AssetRef) -> ExportResult<String> {
        Ok(self.rewrite(&asset.url))
    }
}

fn is_absolute(url: &str) -> bool {
    url.contains("://") || url.starts_with("//") || url.starts_with("data:")
}

/// Export a page, running `optimizer` over every asset in the manifest.
///
/// The manifest and the markup both carry the optimized URLs. The first
/// optimizer failure aborts the export.
#[instrument(skip_all, fields(nodes = doc.len()))]
pub async fn export_with_assets(
    doc: &Document,
    registry: &SchemaRegistry,
    options: &ExportOptions,
    optimizer: &dyn AssetOptimizer,
) -> ExportResult<ExportBundle> {
    let snapshot = doc.clone();
    let assets = collect_assets(&snapshot, registry);

    let urls = try_join_all(assets.iter().map(|asset| optimizer.optimize(asset))).await?;

    let mut asset_urls = HashMap::with_capacity(assets.len());
    let optimized: Vec<AssetRef> = assets
        .into_iter()
        .zip(urls)
        .map(|(asset, url)| {
            debug!(asset = %asset.id, from = %asset.url, to = %url, "Asset optimized");
            asset_urls.insert(asset.url.clone(), url.clone());
            AssetRef { url, ..asset }
        })
        .collect();

    compile_with_assets(&snapshot, registry, options, optimized, &asset_urls)
}

/// [`export_with_assets`] with the optimizer implied by `options`: a
/// [`CdnRewriter`] when `asset_base_url` is set, untouched URLs otherwise.
pub async fn export(
    doc: &Document,
    registry: &SchemaRegistry,
    options: &ExportOptions,
) -> ExportResult<ExportBundle> {
    match &options.asset_base_url {
        Some(base) => export_with_assets(doc, registry, options, &CdnRewriter::new(base)).await,
        None => compile_bundle(doc, registry, options),
    }
}
