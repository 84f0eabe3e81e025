//! In-memory repository
//!
//! Definitions and groups live in a shared [`CatalogRegistry`]; hierarchy
//! entities, items, and associations live in id-ordered maps behind a `tokio`
//! read-write lock.

use crate::repository::{AssociationFilter, Repository};
use crate::{Error, Result};
use mdm_ir::{Association, Category, EntityId, EntityKind, Family, Item, ItemType};
use mdm_schema::{AttributeDefinition, AttributeGroup, CatalogRegistry, PopulatedGroup};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct MemoryState {
    item_types: BTreeMap<EntityId, ItemType>,
    categories: BTreeMap<EntityId, Category>,
    families: BTreeMap<EntityId, Family>,
    items: BTreeMap<EntityId, Item>,
    associations: BTreeMap<EntityId, Association>,
}

impl MemoryState {
    fn count_references(&self, target: &EntityId) -> usize {
        let is = |id: &EntityId| id == target;
        let is_opt = |id: Option<&EntityId>| id.is_some_and(is);

        let item_types = self
            .item_types
            .values()
            .filter(|t| t.attribute_groups.iter().any(is) || is_opt(t.category.as_ref()))
            .count();
        let categories = self
            .categories
            .values()
            .filter(|c| {
                c.attribute_groups.iter().any(is)
                    || is_opt(c.parent.as_ref())
                    || is_opt(c.item_type.as_ref())
            })
            .count();
        let families = self
            .families
            .values()
            .filter(|f| {
                f.attribute_groups.iter().any(is)
                    || is_opt(f.parent.as_ref())
                    || is_opt(f.category.as_ref())
            })
            .count();
        let items = self
            .items
            .values()
            .filter(|i| is(&i.item_type) || is(&i.category) || is_opt(i.family.as_ref()))
            .count();

        item_types + categories + families + items
    }

    fn unlink(&mut self, id: &EntityId) -> usize {
        let before = self.associations.len();
        self.associations.retain(|_, a| !a.touches(id));
        before - self.associations.len()
    }
}

/// Repository backed by process memory
///
/// Cloning is cheap and clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    registry: Arc<CatalogRegistry>,
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store over an existing definition/group registry
    #[must_use]
    pub fn with_registry(registry: Arc<CatalogRegistry>) -> Self {
        Self {
            registry,
            state: Arc::default(),
        }
    }
}

fn ensure_unique_code<'a, I>(entity: EntityKind, id: &EntityId, code: &str, existing: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a EntityId, &'a str)>,
{
    if existing
        .into_iter()
        .any(|(other_id, other_code)| other_code == code && other_id != id)
    {
        return Err(Error::duplicate(entity, code));
    }
    Ok(())
}

impl Repository for MemoryStore {
    async fn find_item_type(&self, id: &EntityId) -> Result<Option<ItemType>> {
        Ok(self.state.read().await.item_types.get(id).cloned())
    }

    async fn find_category(&self, id: &EntityId) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.get(id).cloned())
    }

    async fn find_family(&self, id: &EntityId) -> Result<Option<Family>> {
        Ok(self.state.read().await.families.get(id).cloned())
    }

    async fn find_item(&self, id: &EntityId) -> Result<Option<Item>> {
        Ok(self.state.read().await.items.get(id).cloned())
    }

    async fn find_definition(&self, id: &EntityId) -> Result<Option<AttributeDefinition>> {
        Ok(self.registry.get_definition(id))
    }

    async fn find_definition_by_code(&self, code: &str) -> Result<Option<AttributeDefinition>> {
        Ok(self.registry.get_definition_by_code(code))
    }

    async fn find_group(&self, id: &EntityId) -> Result<Option<AttributeGroup>> {
        Ok(self.registry.get_group(id))
    }

    async fn find_association(&self, id: &EntityId) -> Result<Option<Association>> {
        Ok(self.state.read().await.associations.get(id).cloned())
    }

    async fn find_associations(&self, filter: &AssociationFilter) -> Result<Vec<Association>> {
        Ok(self
            .state
            .read()
            .await
            .associations
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn find_attribute_groups_by_ids(&self, ids: &[EntityId]) -> Result<Vec<PopulatedGroup>> {
        trace!("Populating {} attribute groups", ids.len());
        Ok(self.registry.populate(ids))
    }

    async fn count_referencing_entities(&self, target: &EntityId) -> Result<usize> {
        let entities = self.state.read().await.count_references(target);
        let groups = self.registry.groups_containing(target).len();
        Ok(entities + groups)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.state.read().await.categories.values().cloned().collect())
    }

    async fn list_families(&self) -> Result<Vec<Family>> {
        Ok(self.state.read().await.families.values().cloned().collect())
    }

    async fn list_items(&self) -> Result<Vec<Item>> {
        Ok(self.state.read().await.items.values().cloned().collect())
    }

    async fn list_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        Ok(self.registry.definitions())
    }

    async fn list_groups(&self) -> Result<Vec<AttributeGroup>> {
        Ok(self.registry.groups())
    }

    async fn save_item_type(&self, item_type: ItemType) -> Result<()> {
        let mut state = self.state.write().await;
        ensure_unique_code(
            EntityKind::ItemType,
            &item_type.id,
            &item_type.code,
            state.item_types.values().map(|t| (&t.id, t.code.as_str())),
        )?;
        debug!("Saving item type: {} ({})", item_type.code, item_type.id);
        state.item_types.insert(item_type.id.clone(), item_type);
        Ok(())
    }

    async fn save_category(&self, category: Category) -> Result<()> {
        let mut state = self.state.write().await;
        ensure_unique_code(
            EntityKind::Category,
            &category.id,
            &category.code,
            state.categories.values().map(|c| (&c.id, c.code.as_str())),
        )?;
        debug!("Saving category: {} ({})", category.code, category.id);
        state.categories.insert(category.id.clone(), category);
        Ok(())
    }

    async fn save_family(&self, family: Family) -> Result<()> {
        let mut state = self.state.write().await;
        ensure_unique_code(
            EntityKind::Family,
            &family.id,
            &family.code,
            state.families.values().map(|f| (&f.id, f.code.as_str())),
        )?;
        debug!("Saving family: {} ({})", family.code, family.id);
        state.families.insert(family.id.clone(), family);
        Ok(())
    }

    async fn save_item(&self, item: Item) -> Result<()> {
        let mut state = self.state.write().await;
        ensure_unique_code(
            EntityKind::Item,
            &item.id,
            &item.code,
            state.items.values().map(|i| (&i.id, i.code.as_str())),
        )?;
        debug!("Saving item: {} ({})", item.code, item.id);
        state.items.insert(item.id.clone(), item);
        Ok(())
    }

    async fn save_definition(&self, definition: AttributeDefinition) -> Result<()> {
        if let Some(owner) = self.registry.definition_code_owner(&definition.code) {
            if owner != definition.id {
                return Err(Error::duplicate(
                    EntityKind::AttributeDefinition,
                    definition.code,
                ));
            }
        }
        debug!("Saving definition: {} ({})", definition.code, definition.id);
        self.registry.register_definition(definition);
        Ok(())
    }

    async fn save_group(&self, group: AttributeGroup) -> Result<()> {
        if let Some(owner) = self.registry.group_code_owner(&group.code) {
            if owner != group.id {
                return Err(Error::duplicate(EntityKind::AttributeGroup, group.code));
            }
        }
        debug!("Saving group: {} ({})", group.code, group.id);
        self.registry.register_group(group);
        Ok(())
    }

    async fn save_association(&self, association: Association) -> Result<()> {
        let mut state = self.state.write().await;
        if state
            .associations
            .values()
            .any(|a| a.id != association.id && a.same_link(&association))
        {
            return Err(Error::DuplicateAssociation {
                from: association.from,
                to: association.to,
                kind: association.kind,
            });
        }
        debug!(
            "Saving association: {} -[{}]-> {} ({})",
            association.from, association.kind, association.to, association.id
        );
        state.associations.insert(association.id.clone(), association);
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<()> {
        let references = self.count_referencing_entities(id).await?;
        if references > 0 {
            return Err(Error::InUse {
                entity: kind,
                id: id.clone(),
                references,
            });
        }

        let removed = match kind {
            EntityKind::AttributeDefinition => self.registry.remove_definition(id).is_some(),
            EntityKind::AttributeGroup => self.registry.remove_group(id).is_some(),
            EntityKind::ItemType => self.state.write().await.item_types.remove(id).is_some(),
            EntityKind::Category => self.state.write().await.categories.remove(id).is_some(),
            EntityKind::Family => self.state.write().await.families.remove(id).is_some(),
            EntityKind::Item => self.state.write().await.items.remove(id).is_some(),
            EntityKind::Association => self.state.write().await.associations.remove(id).is_some(),
        };

        if !removed {
            return Err(Error::not_found(kind, id.clone()));
        }
        let unlinked = self.state.write().await.unlink(id);
        debug!("Deleted {}: {} ({} associations removed)", kind, id, unlinked);
        Ok(())
    }
}
