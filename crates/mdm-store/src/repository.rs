//! The storage capability the engine depends on

use crate::Result;
use mdm_ir::{Association, Category, EntityId, EntityKind, EntityRef, Family, Item, ItemType};
use mdm_schema::{AttributeDefinition, AttributeGroup, PopulatedGroup};

/// Association query; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationFilter {
    pub from_entity: Option<EntityKind>,
    pub from_id: Option<EntityId>,
    pub to_entity: Option<EntityKind>,
    pub to_id: Option<EntityId>,
    pub kind: Option<String>,
}

impl AssociationFilter {
    /// Associations starting at `end`
    #[must_use]
    pub fn outgoing(end: &EntityRef) -> Self {
        Self {
            from_entity: Some(end.entity),
            from_id: Some(end.id.clone()),
            ..Self::default()
        }
    }

    /// Associations ending at `end`
    #[must_use]
    pub fn incoming(end: &EntityRef) -> Self {
        Self {
            to_entity: Some(end.entity),
            to_id: Some(end.id.clone()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn matches(&self, association: &Association) -> bool {
        self.from_entity.is_none_or(|e| e == association.from.entity)
            && self.from_id.as_ref().is_none_or(|id| *id == association.from.id)
            && self.to_entity.is_none_or(|e| e == association.to.entity)
            && self.to_id.as_ref().is_none_or(|id| *id == association.to.id)
            && self.kind.as_ref().is_none_or(|k| *k == association.kind)
    }
}

/// Async access to catalog entities
///
/// Ids are unique across entity kinds within one repository. Lookups return
/// `Ok(None)` for a missing entity; only storage failures are errors.
#[allow(async_fn_in_trait)]
pub trait Repository {
    async fn find_item_type(&self, id: &EntityId) -> Result<Option<ItemType>>;
    async fn find_category(&self, id: &EntityId) -> Result<Option<Category>>;
    async fn find_family(&self, id: &EntityId) -> Result<Option<Family>>;
    async fn find_item(&self, id: &EntityId) -> Result<Option<Item>>;
    async fn find_definition(&self, id: &EntityId) -> Result<Option<AttributeDefinition>>;
    async fn find_definition_by_code(&self, code: &str) -> Result<Option<AttributeDefinition>>;
    async fn find_group(&self, id: &EntityId) -> Result<Option<AttributeGroup>>;
    async fn find_association(&self, id: &EntityId) -> Result<Option<Association>>;

    /// Associations matching `filter`, ordered by id
    async fn find_associations(&self, filter: &AssociationFilter) -> Result<Vec<Association>>;

    /// Groups populated with their definitions
    ///
    /// Missing group ids are skipped and the result follows the order of
    /// `ids`. Definitions follow each group's listed order.
    async fn find_attribute_groups_by_ids(&self, ids: &[EntityId]) -> Result<Vec<PopulatedGroup>>;

    /// Number of stored entities holding a reference to `target`
    ///
    /// Counts attribute-group attachments, parent links, item-type and
    /// category owner links, item classification links, and group membership
    /// of definitions. Associations are not references.
    async fn count_referencing_entities(&self, target: &EntityId) -> Result<usize>;

    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn list_families(&self) -> Result<Vec<Family>>;
    async fn list_items(&self) -> Result<Vec<Item>>;
    async fn list_definitions(&self) -> Result<Vec<AttributeDefinition>>;
    async fn list_groups(&self) -> Result<Vec<AttributeGroup>>;

    /// Insert or replace; codes are unique per entity kind
    async fn save_item_type(&self, item_type: ItemType) -> Result<()>;
    async fn save_category(&self, category: Category) -> Result<()>;
    async fn save_family(&self, family: Family) -> Result<()>;
    async fn save_item(&self, item: Item) -> Result<()>;
    async fn save_definition(&self, definition: AttributeDefinition) -> Result<()>;
    async fn save_group(&self, group: AttributeGroup) -> Result<()>;

    /// Insert or replace; one association per `(from, to, kind)`
    async fn save_association(&self, association: Association) -> Result<()>;

    /// Remove an entity that nothing references, with every association
    /// touching it
    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<()>;

    async fn delete_association(&self, id: &EntityId) -> Result<()> {
        self.delete(EntityKind::Association, id).await
    }
}
