//! # Pagecraft HTML Compiler
//!
//! Markup pass of the page export.
//!
//! - [`HtmlCompiler`] renders the visible tree to an HTML fragment
//! - [`collect_assets`] builds the asset manifest
//! - [`compile_page`] wraps a fragment in a full document with the
//!   critical styles inlined and the deferred sheet loaded async

mod assets;
mod compiler;
mod page;

pub use assets::{collect_assets, AssetRef};
pub use compiler::{
    compile_to_html, escape_html, is_self_closing, CompileError, CompileOptions, HtmlCompiler,
};
pub use page::{compile_page, PageShell};
