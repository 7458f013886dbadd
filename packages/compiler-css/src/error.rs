use pagecraft_document::NodeId;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Node '{node}' has unknown component type '{component_type}'")]
    UnknownComponentType {
        node: NodeId,
        component_type: String,
    },

    #[error("Invalid style on node '{node}', prop '{prop}': {reason}")]
    InvalidStyle {
        node: NodeId,
        prop: String,
        reason: String,
    },
}
