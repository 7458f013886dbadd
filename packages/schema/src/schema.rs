use crate::kind::{PropKind, PropValue, Props};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of external asset a URL prop points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    Image,
    Font,
    Video,
    Audio,
    Other,
}

/// Declaration of a single prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropSpec {
    #[serde(flatten)]
    pub kind: PropKind,

    #[serde(default)]
    pub default: PropValue,

    /// URL props that should be listed in the export asset manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetKind>,

    /// HTML attribute this prop is rendered to on export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl PropSpec {
    pub fn new(kind: PropKind) -> Self {
        Self {
            kind,
            default: PropValue::Null,
            asset: None,
            attribute: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<PropValue>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_asset(mut self, asset: AssetKind) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn has_default(&self) -> bool {
        !self.default.is_null()
    }
}

/// Which component types a zone accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Accepts {
    Any,
    Only(BTreeSet<String>),
    /// Anything except the listed types
    AnyExcept(BTreeSet<String>),
}

impl Accepts {
    pub fn allows(&self, component_type: &str) -> bool {
        match self {
            Accepts::Any => true,
            Accepts::Only(types) => types.contains(component_type),
            Accepts::AnyExcept(types) => !types.contains(component_type),
        }
    }
}

/// A named child slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub accepts: Accepts,
}

impl ZoneSpec {
    pub fn any() -> Self {
        Self {
            accepts: Accepts::Any,
        }
    }

    pub fn only<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepts: Accepts::Only(types.into_iter().map(Into::into).collect()),
        }
    }

    pub fn any_except<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepts: Accepts::AnyExcept(types.into_iter().map(Into::into).collect()),
        }
    }

    pub fn accepts(&self, component_type: &str) -> bool {
        self.accepts.allows(component_type)
    }
}

/// Everything the editor knows about a component type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// HTML element emitted on export
    pub tag: String,

    #[serde(default)]
    pub props: BTreeMap<String, PropSpec>,

    #[serde(default)]
    pub zones: BTreeMap<String, ZoneSpec>,

    /// Zone used when an insert or move names a parent but no zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_zone: Option<String>,

    /// Prop rendered as the element's text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_prop: Option<String>,
}

impl Schema {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: BTreeMap::new(),
            zones: BTreeMap::new(),
            default_zone: None,
            text_prop: None,
        }
    }

    pub fn prop(mut self, name: impl Into<String>, spec: PropSpec) -> Self {
        self.props.insert(name.into(), spec);
        self
    }

    /// Add a zone. The first zone added becomes the default zone.
    pub fn zone(mut self, name: impl Into<String>, spec: ZoneSpec) -> Self {
        let name = name.into();
        if self.default_zone.is_none() {
            self.default_zone = Some(name.clone());
        }
        self.zones.insert(name, spec);
        self
    }

    pub fn text(mut self, prop: impl Into<String>) -> Self {
        self.text_prop = Some(prop.into());
        self
    }

    pub fn zone_spec(&self, zone: &str) -> Option<&ZoneSpec> {
        self.zones.get(zone)
    }

    pub fn is_container(&self) -> bool {
        !self.zones.is_empty()
    }

    /// Props holding CSS declarations
    pub fn style_props(&self) -> impl Iterator<Item = &str> {
        self.props
            .iter()
            .filter(|(_, spec)| spec.kind == PropKind::Style)
            .map(|(name, _)| name.as_str())
    }

    /// Initial props for a new node: declared defaults overlaid with `props`.
    pub fn with_defaults(&self, props: &Props) -> Props {
        let mut merged: Props = self
            .props
            .iter()
            .filter(|(_, spec)| spec.has_default())
            .map(|(name, spec)| (name.clone(), spec.default.clone()))
            .collect();
        for (name, value) in props {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}
