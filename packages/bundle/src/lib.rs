//! # Pagecraft Bundle
//!
//! Export entry point: turns a committed page into the bundle page delivery
//! serves.
//!
//! - [`compile_bundle`]: synchronous export, asset URLs untouched
//! - [`export_with_assets`]: async export running an [`AssetOptimizer`]
//!   concurrently over the asset manifest
//! - [`export`]: picks one of the two from [`ExportOptions`]

mod bundle;
mod error;
mod optimizer;
mod options;

pub use bundle::{compile_bundle, ExportBundle};
pub use error::{ExportError, ExportResult};
pub use optimizer::{export, export_with_assets, AssetOptimizer, CdnRewriter};
pub use options::ExportOptions;

pub use pagecraft_compiler_html::AssetRef;
