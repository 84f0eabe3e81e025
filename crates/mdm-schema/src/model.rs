//! Attribute definitions, groups, and merged definition sets

use crate::config::AttributeConfig;
use crate::kind::AttributeKind;
use crate::{Error, Result};
use mdm_ir::{EntityId, Value};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

fn default_active() -> bool {
    true
}

/// Definition as it appears on the wire, before kind and config are checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttributeDefinition {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A typed attribute definition
///
/// The config is parsed for its kind on construction, so a definition can only
/// exist with a structurally valid config. The default value is checked
/// separately by the value validator before a definition is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawAttributeDefinition", into = "RawAttributeDefinition")]
pub struct AttributeDefinition {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub config: AttributeConfig,
    pub required: bool,
    pub default_value: Option<Value>,
    pub active: bool,
}

impl AttributeDefinition {
    /// Create an active, optional definition without a default
    pub fn new(
        id: impl Into<EntityId>,
        code: impl Into<String>,
        name: impl Into<String>,
        config: AttributeConfig,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            description: None,
            config,
            required: false,
            default_value: None,
            active: true,
        }
    }

    /// Parse a definition of `kind` with a raw config
    ///
    /// # Errors
    ///
    /// Fails when the config is structurally invalid for the kind.
    pub fn parse(
        id: impl Into<EntityId>,
        code: impl Into<String>,
        kind: AttributeKind,
        config: &Value,
    ) -> Result<Self> {
        let code = code.into();
        let config = AttributeConfig::parse(kind, config)
            .map_err(|issue| Error::config(&code, issue.field, issue.reason))?;
        Ok(Self::new(id, code.clone(), code, config))
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default_value = (!value.is_null()).then_some(value);
        self
    }

    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        self.config.kind()
    }

    /// Whether stored values are immutable once set
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.kind() == AttributeKind::ReadOnly
    }
}

impl TryFrom<RawAttributeDefinition> for AttributeDefinition {
    type Error = Error;

    fn try_from(raw: RawAttributeDefinition) -> Result<Self> {
        let kind: AttributeKind = raw.kind.parse().map_err(|_| {
            Error::config(
                &raw.code,
                "type",
                format!("'{}' is not a known attribute kind", raw.kind),
            )
        })?;
        let config = AttributeConfig::parse(kind, &raw.config)
            .map_err(|issue| Error::config(&raw.code, issue.field, issue.reason))?;

        Ok(Self {
            id: raw.id,
            code: raw.code,
            name: raw.name,
            description: raw.description,
            config,
            required: raw.required,
            default_value: raw.default_value.filter(|v| !v.is_null()),
            active: raw.active,
        })
    }
}

impl From<AttributeDefinition> for RawAttributeDefinition {
    fn from(def: AttributeDefinition) -> Self {
        Self {
            id: def.id,
            code: def.code,
            name: def.name,
            description: def.description,
            kind: def.config.kind().as_str().to_string(),
            config: def.config.to_value(),
            required: def.required,
            default_value: def.default_value,
            active: def.active,
        }
    }
}

/// Named, ordered bundle of attribute definition ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeGroup {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<EntityId>,
}

impl AttributeGroup {
    pub fn new(id: impl Into<EntityId>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            description: None,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attributes<I, T>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the group lists the definition
    #[must_use]
    pub fn contains(&self, definition: &EntityId) -> bool {
        self.attributes.contains(definition)
    }
}

/// A group with its definitions resolved, in the group's listed order
#[derive(Debug, Clone, Serialize)]
pub struct PopulatedGroup {
    pub group: AttributeGroup,
    pub definitions: Vec<AttributeDefinition>,
}

/// Ordered definitions with unique codes
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    definitions: Vec<AttributeDefinition>,
    by_code: HashMap<String, usize>,
}

impl DefinitionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a definition unless its code is taken
    ///
    /// Returns the already-present definition when the code is a duplicate.
    pub fn insert(&mut self, definition: AttributeDefinition) -> Option<&AttributeDefinition> {
        if let Some(&index) = self.by_code.get(&definition.code) {
            return Some(&self.definitions[index]);
        }
        self.by_code
            .insert(definition.code.clone(), self.definitions.len());
        self.definitions.push(definition);
        None
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&AttributeDefinition> {
        self.by_code.get(code).map(|&index| &self.definitions[index])
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeDefinition> {
        self.definitions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Codes in merge order
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.code.as_str()).collect()
    }
}

impl FromIterator<AttributeDefinition> for DefinitionSet {
    /// First occurrence of each code wins
    fn from_iter<I: IntoIterator<Item = AttributeDefinition>>(iter: I) -> Self {
        let mut set = Self::new();
        for definition in iter {
            set.insert(definition);
        }
        set
    }
}

impl<'a> IntoIterator for &'a DefinitionSet {
    type Item = &'a AttributeDefinition;
    type IntoIter = std::slice::Iter<'a, AttributeDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.definitions.iter()
    }
}

impl Serialize for DefinitionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.definitions)
    }
}
