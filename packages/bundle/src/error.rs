use pagecraft_document::InvariantViolation;
use thiserror::Error;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("Document breaks {} structural invariant(s)", .0.len())]
    InvalidDocument(Vec<InvariantViolation>),

    #[error("Style compilation failed: {0}")]
    Css(#[from] pagecraft_compiler_css::CompileError),

    #[error("Markup compilation failed: {0}")]
    Html(#[from] pagecraft_compiler_html::CompileError),

    #[error("Optimizing asset '{asset}' failed: {message}")]
    AssetOptimization { asset: String, message: String },
}

impl ExportError {
    pub fn asset(asset: impl Into<String>, message: impl Into<String>) -> Self {
        ExportError::AssetOptimization {
            asset: asset.into(),
            message: message.into(),
        }
    }
}
