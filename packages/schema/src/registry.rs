use crate::error::SchemaError;
use crate::schema::{Schema, ZoneSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Read-only lookup from component type to [`Schema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRegistry {
    components: BTreeMap<String, Schema>,

    /// Types allowed directly in the document's root children
    #[serde(default = "ZoneSpec::any")]
    root: ZoneSpec,
}

impl SchemaRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Load a registry from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let registry: SchemaRegistry =
            serde_json::from_str(json).map_err(|e| SchemaError::Parse(e.to_string()))?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn lookup(&self, component_type: &str) -> Result<&Schema, SchemaError> {
        self.components
            .get(component_type)
            .ok_or_else(|| SchemaError::UnknownComponentType(component_type.to_string()))
    }

    pub fn get(&self, component_type: &str) -> Option<&Schema> {
        self.components.get(component_type)
    }

    pub fn contains(&self, component_type: &str) -> bool {
        self.components.contains_key(component_type)
    }

    pub fn root_zone(&self) -> &ZoneSpec {
        &self.root
    }

    pub fn component_types(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn validate(&self) -> Result<(), SchemaError> {
        for (component_type, schema) in &self.components {
            if let Some(zone) = &schema.default_zone {
                if !schema.zones.contains_key(zone) {
                    return Err(SchemaError::MissingDefaultZone {
                        component_type: component_type.clone(),
                        zone: zone.clone(),
                    });
                }
            }

            for (prop, spec) in &schema.props {
                if spec.has_default() && !spec.kind.accepts(&spec.default) {
                    return Err(SchemaError::InvalidDefault {
                        component_type: component_type.clone(),
                        prop: prop.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Builds a [`SchemaRegistry`] once at startup.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    components: BTreeMap<String, Schema>,
    root: Option<ZoneSpec>,
}

impl RegistryBuilder {
    pub fn component(
        mut self,
        component_type: impl Into<String>,
        schema: Schema,
    ) -> Result<Self, SchemaError> {
        let component_type = component_type.into();
        if self.components.contains_key(&component_type) {
            return Err(SchemaError::DuplicateComponentType(component_type));
        }
        self.components.insert(component_type, schema);
        Ok(self)
    }

    pub fn root(mut self, root: ZoneSpec) -> Self {
        self.root = Some(root);
        self
    }

    pub fn build(self) -> Result<SchemaRegistry, SchemaError> {
        let registry = SchemaRegistry {
            components: self.components,
            root: self.root.unwrap_or_else(ZoneSpec::any),
        };
        registry.validate()?;
        debug!(components = registry.len(), "Schema registry built");
        Ok(registry)
    }
}
