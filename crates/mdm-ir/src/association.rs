//! Typed links between item types, categories, and families
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use crate::entity::{AttributeMap, EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind given to associations that do not name one
pub const DEFAULT_ASSOCIATION_KIND: &str = "relates";

/// Kind of the link written from a node to the entity that owns it
pub const BELONGS_TO: &str = "belongs_to";

/// Reference to a stored entity of a known kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(entity: EntityKind, id: impl Into<EntityId>) -> Self {
        Self {
            entity,
            id: id.into(),
        }
    }

    pub fn item_type(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::ItemType, id)
    }

    pub fn category(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Category, id)
    }

    pub fn family(id: impl Into<EntityId>) -> Self {
        Self::new(EntityKind::Family, id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entity, self.id)
    }
}

fn default_kind() -> String {
    DEFAULT_ASSOCIATION_KIND.to_string()
}

/// A directed, typed link between two hierarchy entities
///
/// At most one association exists per `(from, to, kind)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub id: EntityId,
    pub from: EntityRef,
    pub to: EntityRef,
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Free-form metadata, not validated
    #[serde(default)]
    pub metadata: AttributeMap,
}

impl Association {
    /// Create a `relates` association with no metadata
    pub fn new(id: impl Into<EntityId>, from: EntityRef, to: EntityRef) -> Self {
        Self {
            id: id.into(),
            from,
            to,
            kind: default_kind(),
            metadata: AttributeMap::new(),
        }
    }

    /// Owner link from `from` to `owner`, with an id derived from both ends
    pub fn belongs_to(from: EntityRef, owner: EntityRef) -> Self {
        let id = format!("{}:{BELONGS_TO}:{}", from.id, owner.id);
        Self::new(id, from, owner).with_kind(BELONGS_TO)
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_metadata(mut self, metadata: AttributeMap) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether `other` joins the same ends with the same kind
    pub fn same_link(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.kind == other.kind
    }

    /// Whether either end is the entity `id`
    pub fn touches(&self, id: &EntityId) -> bool {
        &self.from.id == id || &self.to.id == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults_to_relates() {
        let json = r#"{
            "id": "a1",
            "from": {"entity": "item_type", "id": "it1"},
            "to": {"entity": "family", "id": "f1"}
        }"#;
        let association: Association = serde_json::from_str(json).unwrap();
        assert_eq!(association.kind, DEFAULT_ASSOCIATION_KIND);
        assert_eq!(association.from, EntityRef::item_type("it1"));
        assert_eq!(association.to.entity, EntityKind::Family);
        assert!(association.metadata.is_empty());
    }

    #[test]
    fn test_belongs_to_id_follows_ends() {
        let link = Association::belongs_to(EntityRef::category("c1"), EntityRef::item_type("it1"));
        assert_eq!(link.id.as_str(), "c1:belongs_to:it1");
        assert_eq!(link.kind, BELONGS_TO);
        assert!(link.touches(&"it1".into()));
        assert!(!link.touches(&"c2".into()));
    }

    #[test]
    fn test_same_link_ignores_id_and_metadata() {
        let a = Association::new("a1", EntityRef::family("f1"), EntityRef::category("c1"));
        let mut b = Association::new("a2", EntityRef::family("f1"), EntityRef::category("c1"));
        b.metadata.insert("note".into(), "x".into());
        assert!(a.same_link(&b));
        assert!(!a.same_link(&b.clone().with_kind("replaces")));
    }

    #[test]
    fn test_linkable_kinds() {
        assert!(EntityKind::Category.is_linkable());
        assert!(!EntityKind::Item.is_linkable());
        assert!(!EntityKind::Association.is_linkable());
    }
}
