//! Entity records: item types, hierarchy nodes, and items
#![allow(clippy::must_use_candidate)] // Builder/constructor API intentionally omits pervasive #[must_use].
#![allow(clippy::return_self_not_must_use)] // Fluent builder methods return Self for ergonomics.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Normalized attribute values keyed by attribute code
pub type AttributeMap = BTreeMap<String, Value>;

/// Opaque identifier of a stored entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an identifier string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kinds of stored entities, used in lookups and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ItemType,
    Category,
    Family,
    Item,
    AttributeGroup,
    AttributeDefinition,
    Association,
}

impl EntityKind {
    /// Human-readable name
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::ItemType => "ItemType",
            EntityKind::Category => "Category",
            EntityKind::Family => "Family",
            EntityKind::Item => "Item",
            EntityKind::AttributeGroup => "AttributeGroup",
            EntityKind::AttributeDefinition => "AttributeDefinition",
            EntityKind::Association => "Association",
        }
    }

    /// Whether associations may start or end at this kind
    pub fn is_linkable(self) -> bool {
        matches!(
            self,
            EntityKind::ItemType | EntityKind::Category | EntityKind::Family
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared shape of self-referencing tree entities (categories and families)
///
/// `ancestors` is a derived cache: root-first, excluding the node itself, and
/// always equal to `parent.ancestors ++ [parent]`.
pub trait HierarchyNode {
    /// Entity kind of this tree
    const KIND: EntityKind;

    fn id(&self) -> &EntityId;
    fn parent(&self) -> Option<&EntityId>;
    fn ancestors(&self) -> &[EntityId];
    fn set_ancestors(&mut self, ancestors: Vec<EntityId>);
    fn attribute_groups(&self) -> &[EntityId];
}

/// An item type: the top-level classification of items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemType {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,

    /// Default category used when an item does not name one
    #[serde(default)]
    pub category: Option<EntityId>,

    #[serde(default)]
    pub attribute_groups: Vec<EntityId>,

    #[serde(default)]
    pub attributes: AttributeMap,
}

impl ItemType {
    /// Create an item type with no groups or attributes
    pub fn new(id: impl Into<EntityId>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            description: String::new(),
            category: None,
            attribute_groups: Vec::new(),
            attributes: AttributeMap::new(),
        }
    }

    /// Set the default category
    pub fn with_category(mut self, category: impl Into<EntityId>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach attribute groups
    pub fn with_groups<I, T>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        self.attribute_groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

/// A category node; categories form one tree per deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<EntityId>,
    #[serde(default)]
    pub ancestors: Vec<EntityId>,

    /// Item type this category belongs to
    #[serde(default)]
    pub item_type: Option<EntityId>,

    #[serde(default)]
    pub attribute_groups: Vec<EntityId>,
    #[serde(default)]
    pub attributes: AttributeMap,
}

impl Category {
    /// Create a root category
    pub fn new(id: impl Into<EntityId>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            parent: None,
            ancestors: Vec::new(),
            item_type: None,
            attribute_groups: Vec::new(),
            attributes: AttributeMap::new(),
        }
    }

    /// Set the parent reference (ancestors are recomputed on write)
    pub fn with_parent(mut self, parent: impl Into<EntityId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the owning item type
    pub fn with_item_type(mut self, item_type: impl Into<EntityId>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    /// Attach attribute groups
    pub fn with_groups<I, T>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        self.attribute_groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

impl HierarchyNode for Category {
    const KIND: EntityKind = EntityKind::Category;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn parent(&self) -> Option<&EntityId> {
        self.parent.as_ref()
    }

    fn ancestors(&self) -> &[EntityId] {
        &self.ancestors
    }

    fn set_ancestors(&mut self, ancestors: Vec<EntityId>) {
        self.ancestors = ancestors;
    }

    fn attribute_groups(&self) -> &[EntityId] {
        &self.attribute_groups
    }
}

/// A family node; families form a tree independent of categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<EntityId>,
    #[serde(default)]
    pub ancestors: Vec<EntityId>,

    /// Category this family is used under
    #[serde(default)]
    pub category: Option<EntityId>,

    #[serde(default)]
    pub attribute_groups: Vec<EntityId>,
    #[serde(default)]
    pub attributes: AttributeMap,
}

impl Family {
    /// Create a root family
    pub fn new(id: impl Into<EntityId>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            parent: None,
            ancestors: Vec::new(),
            category: None,
            attribute_groups: Vec::new(),
            attributes: AttributeMap::new(),
        }
    }

    /// Set the parent reference (ancestors are recomputed on write)
    pub fn with_parent(mut self, parent: impl Into<EntityId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the owning category
    pub fn with_category(mut self, category: impl Into<EntityId>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach attribute groups
    pub fn with_groups<I, T>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        self.attribute_groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

impl HierarchyNode for Family {
    const KIND: EntityKind = EntityKind::Family;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn parent(&self) -> Option<&EntityId> {
        self.parent.as_ref()
    }

    fn ancestors(&self) -> &[EntityId] {
        &self.ancestors
    }

    fn set_ancestors(&mut self, ancestors: Vec<EntityId>) {
        self.ancestors = ancestors;
    }

    fn attribute_groups(&self) -> &[EntityId] {
        &self.attribute_groups
    }
}

/// A master-data item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub item_type: EntityId,
    pub category: EntityId,
    #[serde(default)]
    pub family: Option<EntityId>,

    /// Normalized attribute values; only ever replaced wholesale
    #[serde(default)]
    pub attributes: AttributeMap,

    /// Free-form metadata, not validated
    #[serde(default)]
    pub metadata: AttributeMap,
}

impl Item {
    /// Create an item under the given item type and category
    pub fn new(
        id: impl Into<EntityId>,
        code: impl Into<String>,
        name: impl Into<String>,
        item_type: impl Into<EntityId>,
        category: impl Into<EntityId>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            item_type: item_type.into(),
            category: category.into(),
            family: None,
            attributes: AttributeMap::new(),
            metadata: AttributeMap::new(),
        }
    }

    /// Set the family
    pub fn with_family(mut self, family: impl Into<EntityId>) -> Self {
        self.family = Some(family.into());
        self
    }
}
