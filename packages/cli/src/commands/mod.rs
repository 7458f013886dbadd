pub mod export;
pub mod init;
pub mod validate;

pub use export::{export, ExportArgs};
pub use init::{init, InitArgs};
pub use validate::{validate, ValidateArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use pagecraft_document::Document;
use pagecraft_editor::{DocumentStore, FileStore};
use pagecraft_schema::{standard_registry, SchemaRegistry};
use serde::Deserialize;
use std::path::Path;

/// Page files are either a bare document or what the file store writes
#[derive(Deserialize)]
#[serde(untagged)]
enum PageFile {
    Stored { document: Document },
    Bare(Document),
}

/// Component catalog from `schemaPath`, or the built-in one
pub(crate) fn load_registry(config: &Config, cwd: &Path) -> Result<SchemaRegistry> {
    match config.get_schema_path(cwd) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Cannot read schema {}", path.display()))?;
            SchemaRegistry::from_json(&json)
                .with_context(|| format!("Invalid schema {}", path.display()))
        }
        None => Ok(standard_registry()),
    }
}

/// Resolve `input` as a file path first, then as a page id in the storage
/// directory.
pub(crate) async fn load_page(input: &str, config: &Config, cwd: &Path) -> Result<Document> {
    let path = cwd.join(input);
    if path.is_file() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let page: PageFile = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a page document", path.display()))?;
        return Ok(match page {
            PageFile::Stored { document } => document,
            PageFile::Bare(document) => document,
        });
    }

    let store = FileStore::new(config.get_storage_dir(cwd));
    store
        .load(input)
        .await
        .with_context(|| format!("No page file or stored page named '{}'", input))
}
