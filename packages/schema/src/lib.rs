//! # Pagecraft Schema
//!
//! Static component catalog for the page editor.
//!
//! Every node in a document names a component type. The registry maps
//! that type to a [`Schema`]: which props it takes (with their kind and
//! default), which child zones it exposes, and which component types each
//! zone accepts.
//!
//! The registry is built once at startup and never mutated afterwards, so
//! it is shared between sessions as an `Arc<SchemaRegistry>`.

mod builtin;
mod error;
mod kind;
mod registry;
mod schema;

pub use builtin::standard_registry;
pub use error::SchemaError;
pub use kind::{is_safe_css_text, PropKind, PropValue, Props};
pub use registry::{RegistryBuilder, SchemaRegistry};
pub use schema::{Accepts, AssetKind, PropSpec, Schema, ZoneSpec};
