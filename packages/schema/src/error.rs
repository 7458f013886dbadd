use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Unknown component type: {0}")]
    UnknownComponentType(String),

    #[error("Duplicate component type: {0}")]
    DuplicateComponentType(String),

    #[error("Component '{component_type}' declares default zone '{zone}' which does not exist")]
    MissingDefaultZone { component_type: String, zone: String },

    #[error("Default for prop '{prop}' on '{component_type}' does not match its kind")]
    InvalidDefault { component_type: String, prop: String },

    #[error("Invalid schema file: {0}")]
    Parse(String),
}
